use std::sync::Arc;

use tracing::info;

use crate::adapters::store::{IngestOutcome, Registry};
use crate::codec;
use crate::domain::{Error, Result};

/// Collector-side receiver for pushed snapshots.
///
/// Every submission is handled independently: decode, then upsert into the
/// registry keyed by the snapshot's own capture time. A rejected submission
/// affects nothing else; the sender's next period is the retry.
pub struct IngestService {
    registry: Arc<Registry>,
}

impl IngestService {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn ingest(&self, identity: &str, payload: &[u8]) -> Result<IngestOutcome> {
        if identity.trim().is_empty() {
            return Err(Error::MalformedPushRequest {
                part: "application",
            });
        }
        if payload.is_empty() {
            return Err(Error::MalformedPushRequest { part: "data" });
        }

        let snapshot = codec::deserialize(payload)?;
        let captured_at = snapshot.captured_at;
        let outcome = self.registry.record_push(identity, snapshot);

        info!(
            identity,
            %captured_at,
            newly_registered = outcome.newly_registered,
            stored = outcome.stored,
            "snapshot ingested"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HostInfo, Range, Snapshot};

    fn payload() -> Vec<u8> {
        let snapshot = Snapshot::new(
            HostInfo::new("app-01", "10.0.0.12"),
            Vec::new(),
            Range::all(),
        );
        codec::serialize(&snapshot).unwrap()
    }

    #[test]
    fn test_first_push_registers_identity() {
        let registry = Arc::new(Registry::new());
        let service = IngestService::new(Arc::clone(&registry));

        let outcome = service.ingest("Orders-ip:10.0.0.12", &payload()).unwrap();
        assert!(outcome.newly_registered);
        assert!(outcome.stored);
        assert_eq!(registry.entries()[0].name, "Orders-ip:10.0.0.12");
    }

    #[test]
    fn test_replayed_capture_time_is_deduplicated() {
        let registry = Arc::new(Registry::new());
        let service = IngestService::new(Arc::clone(&registry));
        let bytes = payload();

        service.ingest("Orders-ip:10.0.0.12", &bytes).unwrap();
        let replay = service.ingest("Orders-ip:10.0.0.12", &bytes).unwrap();

        assert!(!replay.newly_registered);
        assert!(!replay.stored);
        assert_eq!(registry.history_len("Orders-ip:10.0.0.12"), 1);
    }

    #[test]
    fn test_blank_identity_is_malformed() {
        let service = IngestService::new(Arc::new(Registry::new()));
        let err = service.ingest("  ", &payload()).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedPushRequest {
                part: "application"
            }
        ));
    }

    #[test]
    fn test_garbage_payload_is_corrupted() {
        let registry = Arc::new(Registry::new());
        let service = IngestService::new(Arc::clone(&registry));

        let err = service.ingest("Orders-ip:10.0.0.12", b"not a snapshot").unwrap_err();
        assert!(matches!(err, Error::CorruptedSnapshot(_)));
        // A rejected submission must not register anything.
        assert!(registry.entries().is_empty());
    }
}
