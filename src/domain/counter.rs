use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cumulative metric aggregator for one logical operation category.
///
/// Counters are owned by the live metric source and updated continuously by
/// request threads. Everything that leaves the source is a deep clone, so a
/// counter inside a snapshot never changes after capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub name: String,
    pub hits: u64,
    pub errors: u64,
    pub total_duration_ms: u64,
    pub max_duration_ms: u64,
}

impl Counter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hits: 0,
            errors: 0,
            total_duration_ms: 0,
            max_duration_ms: 0,
        }
    }

    /// Record one completed operation.
    pub fn record(&mut self, duration: Duration, is_error: bool) {
        let millis = duration.as_millis() as u64;
        self.hits += 1;
        if is_error {
            self.errors += 1;
        }
        self.total_duration_ms += millis;
        if millis > self.max_duration_ms {
            self.max_duration_ms = millis;
        }
    }

    pub fn mean_duration_ms(&self) -> u64 {
        if self.hits == 0 {
            return 0;
        }
        self.total_duration_ms / self.hits
    }
}
