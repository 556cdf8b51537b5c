//! Projection and cleanup of the raw season table.
//!
//! Keeps only the columns the pipeline knows about, drops rows whose
//! `position_group` is not one of the eight [`PositionGroup`] codes, and
//! fills missing numeric cells with zero.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::loader::RawTable;
use crate::position::PositionGroup;

pub const POSITION_GROUP_COLUMN: &str = "position_group";

/// Text columns identifying the player.
pub const IDENTITY_COLUMNS: [&str; 5] = [
    "player_name",
    "player_display_name",
    "position",
    POSITION_GROUP_COLUMN,
    "recent_team",
];

/// Numeric statistics carried through to the store, in output order.
pub const NUMERIC_COLUMNS: [&str; 35] = [
    "passing_yards",
    "passing_tds",
    "passing_interceptions",
    "sacks_suffered",
    "sack_fumbles_lost",
    "passing_2pt_conversions",
    "rushing_yards",
    "rushing_tds",
    "rushing_fumbles_lost",
    "rushing_2pt_conversions",
    "receptions",
    "receiving_yards",
    "receiving_tds",
    "receiving_fumbles_lost",
    "receiving_2pt_conversions",
    "special_teams_tds",
    "def_tackles_solo",
    "def_tackle_assists",
    "def_tackles_for_loss",
    "def_fumbles_forced",
    "def_sacks",
    "def_interceptions",
    "def_pass_defended",
    "def_tds",
    "def_fumbles",
    "def_safeties",
    "fumble_recovery_opp",
    "fumble_recovery_tds",
    "punt_return_yards",
    "kickoff_return_yards",
    "fg_made",
    "fg_att",
    "fg_made_distance",
    "pat_made",
    "pat_att",
];

/// A player row restricted to known columns.
///
/// Only columns present in the source appear here; every numeric column that
/// does appear holds a value.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub position_group: PositionGroup,
    identity: Vec<(&'static str, Option<String>)>,
    stats: Vec<(&'static str, f64)>,
}

impl PlayerRecord {
    /// A record with no columns besides its group.
    pub fn new(position_group: PositionGroup) -> Self {
        Self {
            position_group,
            identity: Vec::new(),
            stats: Vec::new(),
        }
    }

    /// A record carrying every numeric column, all zero.
    pub fn zeroed(position_group: PositionGroup) -> Self {
        Self {
            position_group,
            identity: vec![(POSITION_GROUP_COLUMN, Some(position_group.code().to_string()))],
            stats: NUMERIC_COLUMNS.iter().map(|&c| (c, 0.0)).collect(),
        }
    }

    /// Sets `column` to `value`, replacing any existing entry.
    pub fn with_stat(mut self, column: &'static str, value: f64) -> Self {
        match self.stats.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.stats.push((column, value)),
        }
        self
    }

    pub fn with_text(mut self, column: &'static str, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match self.identity.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.identity.push((column, value)),
        }
        self
    }

    pub fn stat(&self, column: &str) -> Option<f64> {
        self.stats
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| *v)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.identity
            .iter()
            .find(|(c, _)| *c == column)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn identity(&self) -> &[(&'static str, Option<String>)] {
        &self.identity
    }

    pub fn stats(&self) -> &[(&'static str, f64)] {
        &self.stats
    }
}

#[derive(Debug, Default)]
pub struct NormalizedTable {
    pub records: Vec<PlayerRecord>,
    /// Rows dropped for an unknown or missing position group.
    pub dropped_rows: usize,
    /// Numeric cells that were present but not parseable, replaced by zero.
    pub coerced_cells: usize,
    /// Projection columns absent from the source.
    pub missing_columns: Vec<&'static str>,
}

impl NormalizedTable {
    pub fn group_counts(&self) -> BTreeMap<PositionGroup, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.position_group).or_insert(0) += 1;
        }
        counts
    }
}

/// Projects, filters and zero-fills `raw`.
///
/// # Errors
///
/// [`PipelineError::SchemaMismatch`] if the source has no `position_group`
/// column, since the row filter cannot be applied without it.
pub fn normalize(raw: &RawTable) -> Result<NormalizedTable> {
    let group_idx = raw
        .column_index(POSITION_GROUP_COLUMN)
        .ok_or_else(|| PipelineError::schema_mismatch(POSITION_GROUP_COLUMN))?;

    let mut missing_columns = Vec::new();
    let mut locate = |columns: &[&'static str]| -> Vec<(&'static str, usize)> {
        columns
            .iter()
            .filter_map(|&c| match raw.column_index(c) {
                Some(idx) => Some((c, idx)),
                None => {
                    missing_columns.push(c);
                    None
                }
            })
            .collect()
    };
    let identity_cols = locate(&IDENTITY_COLUMNS);
    let numeric_cols = locate(&NUMERIC_COLUMNS);

    if !missing_columns.is_empty() {
        debug!(?missing_columns, "Source is missing projection columns");
    }

    let mut table = NormalizedTable {
        missing_columns,
        ..Default::default()
    };

    for row in &raw.records {
        let Some(group) = row.get(group_idx).and_then(PositionGroup::from_code) else {
            table.dropped_rows += 1;
            continue;
        };

        let identity = identity_cols
            .iter()
            .map(|&(c, idx)| {
                let value = row
                    .get(idx)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string);
                (c, value)
            })
            .collect();

        let stats = numeric_cols
            .iter()
            .map(|&(c, idx)| {
                let (value, coerced) = parse_stat(row.get(idx).unwrap_or(""));
                if coerced {
                    table.coerced_cells += 1;
                }
                (c, value)
            })
            .collect();

        table.records.push(PlayerRecord {
            position_group: group,
            identity,
            stats,
        });
    }

    if table.coerced_cells > 0 {
        warn!(
            cells = table.coerced_cells,
            "Unparseable numeric values replaced with 0"
        );
    }

    let groups: Vec<&str> = PositionGroup::ALL.iter().map(|g| g.code()).collect();
    info!(
        rows = table.records.len(),
        dropped = table.dropped_rows,
        groups = %groups.join(", "),
        "Filtered players to position groups"
    );
    for (group, count) in table.group_counts() {
        debug!(%group, count, "Position group count");
    }

    Ok(table)
}

/// Returns the cell's value and whether it had to be coerced from garbage.
/// Blank and NA-style cells are missing values and become zero silently.
fn parse_stat(cell: &str) -> (f64, bool) {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell.eq_ignore_ascii_case("nan") {
        return (0.0, false);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => (v, false),
        _ => (0.0, true),
    }
}
