use serde::{Deserialize, Serialize};

/// Identity and vitals of the process a snapshot was captured from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    pub hostname: String,
    pub address: String,
    pub pid: u32,
    pub uptime_seconds: u64,
}

impl HostInfo {
    pub fn new(hostname: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            address: address.into(),
            pid: std::process::id(),
            uptime_seconds: 0,
        }
    }

    pub fn with_uptime(mut self, uptime_seconds: u64) -> Self {
        self.uptime_seconds = uptime_seconds;
        self
    }
}
