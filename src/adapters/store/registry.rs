use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::domain::{validate_url, Application, Error, Result, Snapshot};

/// What `register` does when the application name is already present.
/// `Replace` gives idempotent upsert semantics; `Reject` enforces uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    Replace,
    Reject,
}

/// Result of merging one pushed snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    /// The identity was seen for the first time and auto-registered.
    pub newly_registered: bool,
    /// The snapshot went into history; false means a replay with an already
    /// known capture time was dropped.
    pub stored: bool,
}

#[derive(Default)]
struct Inner {
    // Vec keeps insertion order, which defines the resolve fallback.
    applications: Vec<Application>,
    history: HashMap<String, BTreeMap<DateTime<Utc>, Snapshot>>,
}

/// Process-wide index of known applications and their pushed history.
///
/// Single-writer discipline behind one lock; readers get cloned snapshots of
/// the state, never references into it. Entries are only removed by explicit
/// administrative action, which this store does not model.
pub struct Registry {
    inner: RwLock<Inner>,
    policy: DuplicatePolicy,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::Replace)
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            policy,
        }
    }

    /// Add or update an application. Every URL must carry an allowed
    /// transport scheme; with `Replace` policy a re-registration swaps the
    /// URL list in place.
    pub fn register(&self, name: &str, urls: Vec<String>) -> Result<()> {
        for url in &urls {
            validate_url(url)?;
        }

        let mut inner = self.inner.write().unwrap();
        match inner.applications.iter_mut().find(|a| a.name == name) {
            Some(existing) => {
                if self.policy == DuplicatePolicy::Reject {
                    return Err(Error::DuplicateApplication {
                        name: name.to_string(),
                    });
                }
                existing.urls = urls;
            }
            None => inner.applications.push(Application::new(name, urls)),
        }
        Ok(())
    }

    /// Resolve a request to one application. A named lookup must exist; an
    /// unnamed lookup falls back to the first registered entry so a UI with
    /// no explicit selection still shows something.
    pub fn resolve(&self, name: Option<&str>) -> Result<Application> {
        let inner = self.inner.read().unwrap();
        match name {
            Some(name) => inner
                .applications
                .iter()
                .find(|a| a.name == name)
                .cloned()
                .ok_or_else(|| Error::ApplicationDataUnavailable {
                    name: name.to_string(),
                }),
            None => inner
                .applications
                .first()
                .cloned()
                .ok_or(Error::NoApplicationsRegistered),
        }
    }

    /// Copy-on-read view of the registry in insertion order.
    pub fn entries(&self) -> Vec<Application> {
        self.inner.read().unwrap().applications.clone()
    }

    /// Merge one pushed snapshot into the identity's history.
    ///
    /// Unknown identities are auto-registered with an empty URL list. History
    /// is keyed by the snapshot's own capture time, never by arrival order; a
    /// replay bearing an already known capture time is deduplicated.
    pub fn record_push(&self, identity: &str, snapshot: Snapshot) -> IngestOutcome {
        let mut inner = self.inner.write().unwrap();

        let newly_registered = match inner.applications.iter_mut().find(|a| a.name == identity) {
            Some(existing) => {
                existing.last_seen = Some(Utc::now());
                false
            }
            None => {
                let mut application = Application::new(identity, Vec::new());
                application.last_seen = Some(Utc::now());
                inner.applications.push(application);
                true
            }
        };

        let history = inner.history.entry(identity.to_string()).or_default();
        let stored = match history.entry(snapshot.captured_at) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(snapshot);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        };

        IngestOutcome {
            newly_registered,
            stored,
        }
    }

    /// Most recent pushed snapshot for an identity, by capture time.
    pub fn latest(&self, name: &str) -> Option<Snapshot> {
        let inner = self.inner.read().unwrap();
        inner
            .history
            .get(name)
            .and_then(|h| h.values().next_back())
            .cloned()
    }

    /// Number of snapshots held for an identity.
    pub fn history_len(&self, name: &str) -> usize {
        let inner = self.inner.read().unwrap();
        inner.history.get(name).map_or(0, |h| h.len())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HostInfo, Range};

    fn snapshot() -> Snapshot {
        Snapshot::new(HostInfo::new("app-01", "10.0.0.12"), Vec::new(), Range::all())
    }

    #[test]
    fn test_resolve_empty_registry() {
        let registry = Registry::new();
        assert!(matches!(
            registry.resolve(None),
            Err(Error::NoApplicationsRegistered)
        ));
    }

    #[test]
    fn test_resolve_falls_back_to_first_entry() {
        let registry = Registry::new();
        registry.register("A", vec!["http://a:1/x".to_string()]).unwrap();
        registry.register("B", vec!["http://b:2/y".to_string()]).unwrap();

        assert_eq!(registry.resolve(None).unwrap().name, "A");
        assert_eq!(registry.resolve(Some("B")).unwrap().name, "B");
    }

    #[test]
    fn test_resolve_unknown_name() {
        let registry = Registry::new();
        registry.register("A", vec!["http://a:1/x".to_string()]).unwrap();

        assert!(matches!(
            registry.resolve(Some("missing")),
            Err(Error::ApplicationDataUnavailable { .. })
        ));
    }

    #[test]
    fn test_register_is_idempotent_upsert() {
        let registry = Registry::new();
        registry.register("x", vec!["http://old:1/".to_string()]).unwrap();
        registry.register("x", vec!["http://new:2/".to_string()]).unwrap();

        let entries = registry.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].urls, vec!["http://new:2/"]);
    }

    #[test]
    fn test_reject_policy_reports_duplicate() {
        let registry = Registry::with_policy(DuplicatePolicy::Reject);
        registry.register("x", vec!["http://a:1/".to_string()]).unwrap();

        assert!(matches!(
            registry.register("x", vec!["http://b:2/".to_string()]),
            Err(Error::DuplicateApplication { .. })
        ));
    }

    #[test]
    fn test_register_validates_schemes() {
        let registry = Registry::new();
        assert!(matches!(
            registry.register("x", vec!["ftp://host".to_string()]),
            Err(Error::InvalidUrlScheme { .. })
        ));
        assert!(registry.entries().is_empty());
    }

    #[test]
    fn test_entries_is_copy_on_read() {
        let registry = Registry::new();
        registry.register("A", vec!["http://a:1/x".to_string()]).unwrap();

        let mut copied = registry.entries();
        copied.clear();
        assert_eq!(registry.entries().len(), 1);
    }

    #[test]
    fn test_record_push_auto_registers_and_dedupes() {
        let registry = Registry::new();
        let first = registry.record_push("Orders-ip:10.0.0.12", snapshot());
        assert!(first.newly_registered);
        assert!(first.stored);

        let replay_at = registry.latest("Orders-ip:10.0.0.12").unwrap().captured_at;
        let replay = snapshot().with_captured_at(replay_at);
        let second = registry.record_push("Orders-ip:10.0.0.12", replay);
        assert!(!second.newly_registered);
        assert!(!second.stored);
        assert_eq!(registry.history_len("Orders-ip:10.0.0.12"), 1);

        let entry = registry.resolve(Some("Orders-ip:10.0.0.12")).unwrap();
        assert!(entry.urls.is_empty());
        assert!(entry.last_seen.is_some());
    }

    #[test]
    fn test_latest_follows_capture_time_not_arrival_order() {
        let registry = Registry::new();
        let newer = snapshot();
        let older = snapshot()
            .with_captured_at(newer.captured_at - chrono::Duration::seconds(60));

        registry.record_push("A", newer.clone());
        registry.record_push("A", older);

        assert_eq!(registry.latest("A").unwrap().captured_at, newer.captured_at);
        assert_eq!(registry.history_len("A"), 2);
    }
}
