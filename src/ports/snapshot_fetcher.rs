use async_trait::async_trait;

use crate::domain::Result;

/// Port for retrieving a serialized snapshot from a monitored application's
/// own endpoint (the pull path).
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// One synchronous request/response cycle against `url`. No retry here;
    /// the caller decides what another attempt means.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
