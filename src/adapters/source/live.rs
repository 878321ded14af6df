use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::domain::{Counter, Error, HostInfo, Result};
use crate::ports::MetricSource;

/// The process's own live counter set.
///
/// Request handlers feed it through `record`; counters accumulate for the
/// whole process lifetime. Everything handed out crosses the lock as a deep
/// clone, so captured snapshots stay frozen while these keep counting.
pub struct LiveMetrics {
    hostname: String,
    address: String,
    counters: RwLock<Vec<Counter>>,
    started: Instant,
}

impl LiveMetrics {
    pub fn new(hostname: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            address: address.into(),
            counters: RwLock::new(Vec::new()),
            started: Instant::now(),
        }
    }

    /// Construct with the machine hostname.
    pub fn detect(address: impl Into<String>) -> Self {
        let hostname = std::fs::read_to_string("/etc/hostname")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        Self::new(hostname, address)
    }

    /// Record one completed operation under `name`, creating the counter on
    /// first use. Registration order is preserved for snapshots.
    pub fn record(&self, name: &str, duration: Duration, is_error: bool) {
        let Ok(mut counters) = self.counters.write() else {
            return;
        };
        match counters.iter_mut().find(|c| c.name == name) {
            Some(counter) => counter.record(duration, is_error),
            None => {
                let mut counter = Counter::new(name);
                counter.record(duration, is_error);
                counters.push(counter);
            }
        }
    }
}

impl MetricSource for LiveMetrics {
    fn host_info(&self) -> Result<HostInfo> {
        Ok(HostInfo::new(self.hostname.clone(), self.address.clone())
            .with_uptime(self.started.elapsed().as_secs()))
    }

    fn counters(&self) -> Result<Vec<Counter>> {
        let counters = self
            .counters
            .read()
            .map_err(|_| Error::SnapshotBuildFailed("live counter state poisoned".to_string()))?;
        Ok(counters.clone())
    }
}
