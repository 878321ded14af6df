use async_trait::async_trait;

use crate::domain::Result;

/// Port for collector-bound transmissions from a monitored instance.
#[async_trait]
pub trait CollectorClient: Send + Sync {
    /// Transmit one serialized snapshot as a multipart submission: a binary
    /// part carrying `payload` under `filename`, plus a text part with the
    /// fully-qualified application identity.
    async fn push_snapshot(
        &self,
        url: &str,
        identity: &str,
        filename: &str,
        payload: Vec<u8>,
    ) -> Result<()>;

    /// Announce this instance to the collector's admin surface so it can be
    /// pulled without manual registration.
    async fn announce(&self, url: &str, identity: &str, app_url: &str) -> Result<()>;
}
