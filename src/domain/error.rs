use thiserror::Error;

/// Failure taxonomy for registration, collection and synchronization.
///
/// Registry and pull errors are surfaced to the caller; push-side errors are
/// logged and swallowed because the periodic timer is itself the retry
/// mechanism.
#[derive(Debug, Error)]
pub enum Error {
    #[error("url must start with http:// or https://: {url}")]
    InvalidUrlScheme { url: String },

    #[error("application already registered: {name}")]
    DuplicateApplication { name: String },

    #[error("no applications registered")]
    NoApplicationsRegistered,

    #[error("data unavailable for the application {name}")]
    ApplicationDataUnavailable { name: String },

    #[error("collection failed for {url}: {detail}")]
    RemoteCollectionFailed { url: String, detail: String },

    #[error("push request is missing the {part} part")]
    MalformedPushRequest { part: &'static str },

    #[error("corrupted snapshot: {0}")]
    CorruptedSnapshot(String),

    #[error("snapshot capture failed: {0}")]
    SnapshotBuildFailed(String),

    #[error("missing configuration: {0}")]
    ConfigurationMissing(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
