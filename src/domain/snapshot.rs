use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Counter, HostInfo, Range};

/// Immutable bundle of cloned counters plus host information, captured at
/// one instant.
///
/// A snapshot is built fresh on every push or pull cycle and never mutated
/// afterwards; the live counters keep accumulating while this frozen view is
/// serialized and transmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub host: HostInfo,
    pub counters: Vec<Counter>,
    pub captured_at: DateTime<Utc>,
    pub range: Range,
}

impl Snapshot {
    pub fn new(host: HostInfo, counters: Vec<Counter>, range: Range) -> Self {
        Self {
            host,
            counters,
            captured_at: Utc::now(),
            range,
        }
    }

    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = captured_at;
        self
    }

    pub fn counter(&self, name: &str) -> Option<&Counter> {
        self.counters.iter().find(|c| c.name == name)
    }
}
