pub mod registry;

pub use registry::{DuplicatePolicy, IngestOutcome, Registry};
