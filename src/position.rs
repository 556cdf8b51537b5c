use std::fmt;

/// Positional group code. Rows with any other label never leave the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PositionGroup {
    QB,
    RB,
    WR,
    TE,
    DL,
    LB,
    DB,
    ST,
}

/// Which scoring formula applies to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Offense,
    Defense,
    SpecialTeams,
}

impl PositionGroup {
    pub const ALL: [PositionGroup; 8] = [
        PositionGroup::QB,
        PositionGroup::RB,
        PositionGroup::WR,
        PositionGroup::TE,
        PositionGroup::DL,
        PositionGroup::LB,
        PositionGroup::DB,
        PositionGroup::ST,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            PositionGroup::QB => "QB",
            PositionGroup::RB => "RB",
            PositionGroup::WR => "WR",
            PositionGroup::TE => "TE",
            PositionGroup::DL => "DL",
            PositionGroup::LB => "LB",
            PositionGroup::DB => "DB",
            PositionGroup::ST => "ST",
        }
    }

    /// Exact, case-sensitive match after trimming whitespace.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL.into_iter().find(|g| g.code() == code)
    }

    pub fn side(&self) -> Side {
        match self {
            PositionGroup::QB | PositionGroup::RB | PositionGroup::WR | PositionGroup::TE => {
                Side::Offense
            }
            PositionGroup::DL | PositionGroup::LB | PositionGroup::DB => Side::Defense,
            PositionGroup::ST => Side::SpecialTeams,
        }
    }
}

impl fmt::Display for PositionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_round_trips_every_group() {
        for group in PositionGroup::ALL {
            assert_eq!(PositionGroup::from_code(group.code()), Some(group));
        }
    }

    #[test]
    fn test_from_code_rejects_unknown_and_lowercase() {
        assert_eq!(PositionGroup::from_code("K"), None);
        assert_eq!(PositionGroup::from_code("SPEC"), None);
        assert_eq!(PositionGroup::from_code("qb"), None);
        assert_eq!(PositionGroup::from_code(""), None);
        assert_eq!(PositionGroup::from_code(" QB "), Some(PositionGroup::QB));
    }

    #[test]
    fn test_sides() {
        let offense = PositionGroup::ALL
            .iter()
            .filter(|g| g.side() == Side::Offense)
            .count();
        let defense = PositionGroup::ALL
            .iter()
            .filter(|g| g.side() == Side::Defense)
            .count();
        assert_eq!(offense, 4);
        assert_eq!(defense, 3);
        assert_eq!(PositionGroup::ST.side(), Side::SpecialTeams);
    }
}
