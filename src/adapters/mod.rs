pub mod http;
pub mod net;
pub mod source;
pub mod store;

pub use http::{HttpCollectorClient, HttpSnapshotFetcher};
pub use source::LiveMetrics;
pub use store::{DuplicatePolicy, Registry};
