use std::sync::Arc;

use tracing::warn;

use crate::adapters::store::Registry;
use crate::codec;
use crate::domain::{Application, Error, Range, Result, Snapshot};
use crate::ports::SnapshotFetcher;

/// Where the returned snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Fetched live from one of the application's registered URLs.
    Remote,
    /// Served from the history pushed to this collector.
    Stored,
}

#[derive(Debug, Clone)]
pub struct PulledData {
    pub application: Application,
    pub snapshot: Snapshot,
    pub source: DataSource,
}

/// On-demand retrieval of a named (or default) application's data.
///
/// One invocation is exactly one attempt per URL; the calling layer decides
/// whether to retry.
pub struct PullCoordinator {
    registry: Arc<Registry>,
    fetcher: Arc<dyn SnapshotFetcher>,
}

impl PullCoordinator {
    pub fn new(registry: Arc<Registry>, fetcher: Arc<dyn SnapshotFetcher>) -> Self {
        Self { registry, fetcher }
    }

    pub async fn collect(&self, name: Option<&str>, range: &Range) -> Result<PulledData> {
        let application = self.registry.resolve(name)?;

        // Push-registered identities carry no URLs; their data lives here.
        if application.urls.is_empty() {
            let snapshot = self.registry.latest(&application.name).ok_or_else(|| {
                Error::ApplicationDataUnavailable {
                    name: application.name.clone(),
                }
            })?;
            return Ok(PulledData {
                application,
                snapshot,
                source: DataSource::Stored,
            });
        }

        let mut last_failure = None;
        for url in &application.urls {
            let target = with_range(url, range);
            match self.fetcher.fetch(&target).await {
                Ok(bytes) => {
                    let snapshot = codec::deserialize(&bytes)?;
                    return Ok(PulledData {
                        application,
                        snapshot,
                        source: DataSource::Remote,
                    });
                }
                Err(e) => {
                    warn!(url = %target, error = %e, "pull attempt failed");
                    last_failure = Some(Error::RemoteCollectionFailed {
                        url: target,
                        detail: e.to_string(),
                    });
                }
            }
        }

        Err(last_failure.unwrap_or(Error::ApplicationDataUnavailable {
            name: application.name,
        }))
    }
}

fn with_range(url: &str, range: &Range) -> String {
    let query = range.to_query();
    if query.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&{query}")
    } else {
        format!("{url}?{query}")
    }
}
