pub mod announce;
pub mod ingest;
pub mod pull;
pub mod push;

pub use announce::{Announcer, AnnouncerHandle};
pub use ingest::IngestService;
pub use pull::{DataSource, PullCoordinator, PulledData};
pub use push::{full_identity, PushClient, PushLifecycle, PushScheduler};
