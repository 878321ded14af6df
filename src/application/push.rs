use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::codec;
use crate::domain::{Range, Result};
use crate::ports::{CollectorClient, MetricSource};

/// Fully-qualified identity of a pushing instance: the application name with
/// spaces stripped, qualified by the instance address.
pub fn full_identity(app_name: &str, address: &str) -> String {
    format!("{}-ip:{}", app_name.replace(' ', ""), address)
}

/// One push cycle: capture, serialize, transmit.
pub struct PushClient {
    source: Arc<dyn MetricSource>,
    collector: Arc<dyn CollectorClient>,
    push_url: String,
    identity: String,
}

impl PushClient {
    pub fn new(
        source: Arc<dyn MetricSource>,
        collector: Arc<dyn CollectorClient>,
        push_url: String,
        identity: String,
    ) -> Self {
        Self {
            source,
            collector,
            push_url,
            identity,
        }
    }

    /// Capture a fresh full-range snapshot and transmit it. Nothing is
    /// buffered: a failed payload is abandoned and the next cycle captures
    /// anew.
    pub async fn run_cycle(&self) -> Result<()> {
        let snapshot = self.source.capture(Range::all())?;
        let payload = codec::serialize(&snapshot)?;
        let filename = format!(
            "{}-{}.rsnap",
            self.identity,
            snapshot.captured_at.format("%Y-%m-%d")
        );
        self.collector
            .push_snapshot(&self.push_url, &self.identity, &filename, payload)
            .await
    }
}

/// Timing for the periodic push task: first execution after `initial_delay`
/// (letting the local server finish booting), then every `period`.
pub struct PushScheduler {
    client: PushClient,
    initial_delay: Duration,
    period: Duration,
}

impl PushScheduler {
    pub fn new(client: PushClient, initial_delay: Duration, period: Duration) -> Self {
        Self {
            client,
            initial_delay,
            period,
        }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>, cycle_running: Arc<AtomicBool>) {
        tokio::select! {
            _ = tokio::time::sleep(self.initial_delay) => {}
            _ = shutdown.changed() => return,
        }

        let mut ticker = tokio::time::interval(self.period);
        // An overrunning cycle delays the next firing instead of letting
        // ticks pile up and run back to back.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            cycle_running.store(true, Ordering::SeqCst);
            if let Err(e) = self.client.run_cycle().await {
                warn!(error = %e, "push cycle failed, retrying next period");
            }
            cycle_running.store(false, Ordering::SeqCst);

            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => return,
            }
        }
    }
}

enum LifecycleState {
    Idle(PushScheduler),
    Running {
        shutdown: watch::Sender<bool>,
        cycle_running: Arc<AtomicBool>,
    },
    Stopped,
}

/// Process-wide handle for the scheduled push task.
///
/// Constructed exactly once at bootstrap and shared by reference; `start` is
/// idempotent and `stop` cancels future firings while letting an in-flight
/// cycle finish on its own.
pub struct PushLifecycle {
    state: Mutex<LifecycleState>,
}

impl PushLifecycle {
    pub fn new(scheduler: PushScheduler) -> Self {
        Self {
            state: Mutex::new(LifecycleState::Idle(scheduler)),
        }
    }

    /// Spawn the scheduler task. Returns false (and does nothing) if it was
    /// already started or has been stopped.
    pub fn start(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        match std::mem::replace(&mut *state, LifecycleState::Stopped) {
            LifecycleState::Idle(scheduler) => {
                let (shutdown, receiver) = watch::channel(false);
                let cycle_running = Arc::new(AtomicBool::new(false));
                tokio::spawn(scheduler.run(receiver, Arc::clone(&cycle_running)));
                *state = LifecycleState::Running {
                    shutdown,
                    cycle_running,
                };
                info!("push scheduler started");
                true
            }
            other => {
                debug!("push scheduler already started");
                *state = other;
                false
            }
        }
    }

    /// Cancel future firings. The running cycle, if any, completes or times
    /// out on its own.
    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap();
        if let LifecycleState::Running { shutdown, .. } =
            std::mem::replace(&mut *state, LifecycleState::Stopped)
        {
            let _ = shutdown.send(true);
            info!("push scheduler stopped");
        }
    }

    /// Whether a push cycle is in flight right now.
    pub fn is_cycle_running(&self) -> bool {
        match &*self.state.lock().unwrap() {
            LifecycleState::Running { cycle_running, .. } => cycle_running.load(Ordering::SeqCst),
            _ => false,
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(&*self.state.lock().unwrap(), LifecycleState::Running { .. })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use super::*;
    use crate::adapters::LiveMetrics;
    use crate::domain::Error;

    struct RecordingCollector {
        pushes: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        cycle_time: Duration,
        fail: bool,
    }

    impl RecordingCollector {
        fn new(cycle_time: Duration, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                pushes: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                cycle_time,
                fail,
            })
        }
    }

    #[async_trait]
    impl CollectorClient for RecordingCollector {
        async fn push_snapshot(
            &self,
            url: &str,
            _identity: &str,
            _filename: &str,
            _payload: Vec<u8>,
        ) -> Result<()> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            tokio::time::sleep(self.cycle_time).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.pushes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::RemoteCollectionFailed {
                    url: url.to_string(),
                    detail: "collector unreachable".to_string(),
                });
            }
            Ok(())
        }

        async fn announce(&self, _url: &str, _identity: &str, _app_url: &str) -> Result<()> {
            Ok(())
        }
    }

    fn scheduler(collector: Arc<RecordingCollector>, period: Duration) -> PushScheduler {
        let source = Arc::new(LiveMetrics::new("test-host", "10.0.0.1"));
        let client = PushClient::new(
            source,
            collector,
            "http://collector.internal/monitoring/push".to_string(),
            full_identity("Orders", "10.0.0.1"),
        );
        PushScheduler::new(client, Duration::ZERO, period)
    }

    #[test]
    fn test_full_identity_strips_spaces() {
        assert_eq!(
            full_identity("Order Service", "10.0.0.12"),
            "OrderService-ip:10.0.0.12"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_periods_never_run_two_cycles() {
        // Each transmission takes 2.5 periods; cycles must serialize.
        let collector = RecordingCollector::new(Duration::from_millis(2500), false);
        let lifecycle = PushLifecycle::new(scheduler(Arc::clone(&collector), Duration::from_secs(1)));
        assert!(lifecycle.start());

        tokio::time::sleep(Duration::from_secs(12)).await;

        assert!(collector.pushes.load(Ordering::SeqCst) >= 2);
        assert_eq!(collector.max_in_flight.load(Ordering::SeqCst), 1);
        lifecycle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_is_followed_by_another_period() {
        let collector = RecordingCollector::new(Duration::ZERO, true);
        let lifecycle = PushLifecycle::new(scheduler(Arc::clone(&collector), Duration::from_secs(1)));
        lifecycle.start();

        tokio::time::sleep(Duration::from_millis(3500)).await;

        // Every attempt failed, yet the timer kept firing once per period.
        assert!(collector.pushes.load(Ordering::SeqCst) >= 3);
        lifecycle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let collector = RecordingCollector::new(Duration::ZERO, false);
        let lifecycle = PushLifecycle::new(scheduler(Arc::clone(&collector), Duration::from_secs(1)));

        assert!(lifecycle.start());
        assert!(!lifecycle.start());
        assert!(lifecycle.is_started());

        tokio::time::sleep(Duration::from_millis(2100)).await;

        // One task firing once per period, not two.
        let pushes = collector.pushes.load(Ordering::SeqCst);
        assert!((2..=3).contains(&pushes), "unexpected push count {pushes}");
        lifecycle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_future_firings() {
        let collector = RecordingCollector::new(Duration::ZERO, false);
        let lifecycle = PushLifecycle::new(scheduler(Arc::clone(&collector), Duration::from_secs(1)));
        lifecycle.start();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        lifecycle.stop();
        assert!(!lifecycle.is_started());
        let after_stop = collector.pushes.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(collector.pushes.load(Ordering::SeqCst), after_stop);

        // Once stopped, the lifecycle cannot be restarted.
        assert!(!lifecycle.start());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_running_is_observable_mid_flight() {
        let collector = RecordingCollector::new(Duration::from_secs(10), false);
        let lifecycle = PushLifecycle::new(scheduler(Arc::clone(&collector), Duration::from_secs(30)));
        lifecycle.start();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(lifecycle.is_cycle_running());

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(!lifecycle.is_cycle_running());
        lifecycle.stop();
    }
}
