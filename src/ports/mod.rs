pub mod collector_client;
pub mod metric_source;
pub mod snapshot_fetcher;

pub use collector_client::CollectorClient;
pub use metric_source::MetricSource;
pub use snapshot_fetcher::SnapshotFetcher;
