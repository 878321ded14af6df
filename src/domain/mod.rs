pub mod application;
pub mod counter;
pub mod error;
pub mod host;
pub mod range;
pub mod snapshot;

pub use application::{parse_url_list, validate_url, Application};
pub use counter::Counter;
pub use error::{Error, Result};
pub use host::HostInfo;
pub use range::{Range, RangeKind};
pub use snapshot::Snapshot;
