use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::scoring::ScoredRecord;

/// A scored record stamped with its write time.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRow {
    pub record: ScoredRecord,
    pub last_updated: DateTime<Utc>,
}

/// Stamps every record with the same `now`.
pub fn stamp(records: Vec<ScoredRecord>, now: DateTime<Utc>) -> Vec<PersistedRow> {
    records
        .into_iter()
        .map(|record| PersistedRow {
            record,
            last_updated: now,
        })
        .collect()
}

/// Whole-number stats go out as JSON integers so they load into both integer
/// and floating point columns.
struct Stat(f64);

impl Serialize for Stat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
        if self.0.fract() == 0.0 && self.0.abs() < MAX_EXACT {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl Serialize for PersistedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let player = self.record.record();
        let len = player.identity().len() + player.stats().len() + 2;

        let mut map = serializer.serialize_map(Some(len))?;
        for (column, value) in player.identity() {
            map.serialize_entry(column, value)?;
        }
        for (column, value) in player.stats() {
            map.serialize_entry(column, &Stat(*value))?;
        }
        map.serialize_entry("fantasy_points", &self.record.fantasy_points())?;
        map.serialize_entry("last_updated", &self.last_updated)?;
        map.end()
    }
}
