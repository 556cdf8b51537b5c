//! Fantasy point scoring.
//!
//! Each side of the ball has a fixed table of terms applied in order. Special
//! teams players score zero.

use tracing::info;

use crate::error::{PipelineError, Result};
use crate::normalize::PlayerRecord;
use crate::position::Side;

/// One term of a scoring formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Term {
    /// `total += value * factor`
    Add(&'static str, f64),
    /// `total -= value * factor`
    Sub(&'static str, f64),
    /// `total += value / divisor`
    Per(&'static str, f64),
}

impl Term {
    pub fn column(&self) -> &'static str {
        match *self {
            Term::Add(c, _) | Term::Sub(c, _) | Term::Per(c, _) => c,
        }
    }

    fn apply(&self, total: f64, value: f64) -> f64 {
        match *self {
            Term::Add(_, factor) => total + value * factor,
            Term::Sub(_, factor) => total - value * factor,
            Term::Per(_, divisor) => total + value / divisor,
        }
    }
}

pub static OFFENSE_TERMS: &[Term] = &[
    // passing
    Term::Per("passing_yards", 25.0),
    Term::Add("passing_tds", 4.0),
    Term::Sub("passing_interceptions", 2.0),
    Term::Sub("sacks_suffered", 0.5),
    Term::Sub("sack_fumbles_lost", 2.0),
    Term::Add("passing_2pt_conversions", 2.0),
    // rushing
    Term::Per("rushing_yards", 10.0),
    Term::Add("rushing_tds", 6.0),
    Term::Sub("rushing_fumbles_lost", 2.0),
    Term::Add("rushing_2pt_conversions", 2.0),
    // receiving
    Term::Add("receptions", 0.5),
    Term::Per("receiving_yards", 10.0),
    Term::Add("receiving_tds", 6.0),
    Term::Sub("receiving_fumbles_lost", 2.0),
    Term::Add("receiving_2pt_conversions", 2.0),
    // returns
    Term::Add("special_teams_tds", 15.0),
    Term::Per("punt_return_yards", 20.0),
    Term::Per("kickoff_return_yards", 20.0),
];

pub static DEFENSE_TERMS: &[Term] = &[
    Term::Add("def_tackles_solo", 1.0),
    Term::Add("def_tackle_assists", 0.5),
    Term::Add("def_tackles_for_loss", 2.0),
    Term::Add("def_fumbles_forced", 5.0),
    Term::Add("def_sacks", 4.0),
    Term::Add("def_interceptions", 7.0),
    Term::Add("def_pass_defended", 3.0),
    Term::Add("def_tds", 6.0),
    Term::Add("def_safeties", 2.0),
    Term::Add("fumble_recovery_opp", 3.0),
    Term::Add("fumble_recovery_tds", 6.0),
];

pub fn terms_for(side: Side) -> &'static [Term] {
    match side {
        Side::Offense => OFFENSE_TERMS,
        Side::Defense => DEFENSE_TERMS,
        Side::SpecialTeams => &[],
    }
}

/// Computes the fantasy points for one record.
///
/// # Errors
///
/// [`PipelineError::SchemaMismatch`] naming the first column the formula
/// needs that the record does not carry.
pub fn score(record: &PlayerRecord) -> Result<f64> {
    terms_for(record.position_group.side())
        .iter()
        .try_fold(0.0, |total, term| -> Result<f64> {
            let value = record
                .stat(term.column())
                .ok_or_else(|| PipelineError::schema_mismatch(term.column()))?;
            Ok(term.apply(total, value))
        })
}

/// A normalized record with its computed points. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    record: PlayerRecord,
    fantasy_points: f64,
}

impl ScoredRecord {
    pub fn new(record: PlayerRecord) -> Result<Self> {
        let fantasy_points = score(&record)?;
        Ok(Self {
            record,
            fantasy_points,
        })
    }

    pub fn record(&self) -> &PlayerRecord {
        &self.record
    }

    pub fn fantasy_points(&self) -> f64 {
        self.fantasy_points
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    pub scored: usize,
    pub max_points: f64,
    pub mean_points: f64,
}

/// Scores every record, failing on the first schema problem.
pub fn score_all(records: Vec<PlayerRecord>) -> Result<Vec<ScoredRecord>> {
    info!(records = records.len(), "Calculating fantasy points");
    let scored = records
        .into_iter()
        .map(ScoredRecord::new)
        .collect::<Result<Vec<_>>>()?;

    let summary = summarize(&scored);
    info!(
        scored = summary.scored,
        max_points = summary.max_points,
        mean_points = summary.mean_points,
        "Fantasy points calculated"
    );
    Ok(scored)
}

pub fn summarize(scored: &[ScoredRecord]) -> ScoreSummary {
    if scored.is_empty() {
        return ScoreSummary::default();
    }
    let points = scored.iter().map(ScoredRecord::fantasy_points);
    ScoreSummary {
        scored: scored.len(),
        max_points: points.clone().fold(f64::NEG_INFINITY, f64::max),
        mean_points: points.sum::<f64>() / scored.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionGroup;

    #[test]
    fn test_all_zero_records_score_zero() {
        for group in PositionGroup::ALL {
            assert_eq!(score(&PlayerRecord::zeroed(group)).unwrap(), 0.0, "{group}");
        }
    }

    #[test]
    fn test_passing_line() {
        let record = PlayerRecord::zeroed(PositionGroup::QB)
            .with_stat("passing_yards", 250.0)
            .with_stat("passing_tds", 2.0)
            .with_stat("passing_interceptions", 1.0);
        assert_eq!(score(&record).unwrap(), 16.0);
    }

    #[test]
    fn test_defensive_line() {
        let record = PlayerRecord::zeroed(PositionGroup::LB)
            .with_stat("def_sacks", 2.0)
            .with_stat("def_interceptions", 1.0);
        assert_eq!(score(&record).unwrap(), 15.0);
    }

    #[test]
    fn test_skill_position_line() {
        // 80/10 + 1*6 + 5*0.5 + 60/10 - 1*2 + 40/20
        let record = PlayerRecord::zeroed(PositionGroup::WR)
            .with_stat("rushing_yards", 80.0)
            .with_stat("rushing_tds", 1.0)
            .with_stat("receptions", 5.0)
            .with_stat("receiving_yards", 60.0)
            .with_stat("receiving_fumbles_lost", 1.0)
            .with_stat("kickoff_return_yards", 40.0);
        assert_eq!(score(&record).unwrap(), 8.0 + 6.0 + 2.5 + 6.0 - 2.0 + 2.0);
    }

    #[test]
    fn test_defensive_stats_ignored_for_offense() {
        let record = PlayerRecord::zeroed(PositionGroup::TE).with_stat("def_sacks", 3.0);
        assert_eq!(score(&record).unwrap(), 0.0);
    }

    #[test]
    fn test_special_teams_scores_zero_even_with_stats() {
        let record = PlayerRecord::zeroed(PositionGroup::ST)
            .with_stat("special_teams_tds", 2.0)
            .with_stat("fg_made", 4.0);
        assert_eq!(score(&record).unwrap(), 0.0);
    }

    #[test]
    fn test_special_teams_needs_no_columns() {
        assert_eq!(score(&PlayerRecord::new(PositionGroup::ST)).unwrap(), 0.0);
    }

    #[test]
    fn test_score_is_deterministic() {
        let record = PlayerRecord::zeroed(PositionGroup::RB)
            .with_stat("rushing_yards", 97.0)
            .with_stat("sacks_suffered", 3.0)
            .with_stat("punt_return_yards", 13.0);
        let first = score(&record).unwrap();
        for _ in 0..10 {
            assert_eq!(score(&record).unwrap().to_bits(), first.to_bits());
        }
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let record = PlayerRecord::new(PositionGroup::DB).with_stat("def_tackles_solo", 4.0);
        let err = score(&record).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { ref column } if column == "def_tackle_assists"));
    }

    #[test]
    fn test_terms_reference_known_columns() {
        for term in OFFENSE_TERMS.iter().chain(DEFENSE_TERMS) {
            assert!(
                crate::normalize::NUMERIC_COLUMNS.contains(&term.column()),
                "{}",
                term.column()
            );
        }
    }

    #[test]
    fn test_score_all_and_summary() {
        let records = vec![
            PlayerRecord::zeroed(PositionGroup::QB).with_stat("passing_tds", 3.0),
            PlayerRecord::zeroed(PositionGroup::DL).with_stat("def_sacks", 1.0),
        ];
        let scored = score_all(records).unwrap();
        assert_eq!(scored[0].fantasy_points(), 12.0);
        assert_eq!(scored[1].fantasy_points(), 4.0);

        let summary = summarize(&scored);
        assert_eq!(summary.scored, 2);
        assert_eq!(summary.max_points, 12.0);
        assert_eq!(summary.mean_points, 8.0);
    }

    #[test]
    fn test_score_all_fails_on_first_bad_record() {
        let records = vec![
            PlayerRecord::zeroed(PositionGroup::QB),
            PlayerRecord::new(PositionGroup::QB),
        ];
        assert!(matches!(
            score_all(records),
            Err(PipelineError::SchemaMismatch { .. })
        ));
    }
}
