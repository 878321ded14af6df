use crate::domain::{Counter, HostInfo, Range, Result, Snapshot};

/// Port for the live, concurrently-updated metric source.
///
/// The source exclusively owns its counters; the only read access this
/// subsystem is allowed is the clone-on-capture pass below. Both accessors
/// return frozen copies, never references into live state.
pub trait MetricSource: Send + Sync {
    /// Host identity and vitals at this instant.
    fn host_info(&self) -> Result<HostInfo>;

    /// Deep-cloned copies of every live counter, in registration order.
    fn counters(&self) -> Result<Vec<Counter>>;

    /// Assemble an immutable snapshot from cloned state.
    ///
    /// Any failure aborts the whole capture; a partial snapshot is never
    /// produced. The live source keeps accumulating while the returned value
    /// is serialized and transmitted.
    fn capture(&self, range: Range) -> Result<Snapshot> {
        let host = self.host_info()?;
        let counters = self.counters()?;
        Ok(Snapshot::new(host, counters, range))
    }
}
