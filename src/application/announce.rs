use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::ports::CollectorClient;

/// Periodic self-registration with the collector's admin surface.
///
/// Lets the collector pull this instance without an operator filling in the
/// add-application form. Failures are logged and swallowed; the next period
/// announces again.
pub struct Announcer {
    collector: Arc<dyn CollectorClient>,
    admin_url: String,
    identity: String,
    app_url: String,
    initial_delay: Duration,
    period: Duration,
}

pub struct AnnouncerHandle {
    shutdown: watch::Sender<bool>,
}

impl AnnouncerHandle {
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl Announcer {
    pub fn new(
        collector: Arc<dyn CollectorClient>,
        admin_url: String,
        identity: String,
        app_url: String,
        initial_delay: Duration,
        period: Duration,
    ) -> Self {
        Self {
            collector,
            admin_url,
            identity,
            app_url,
            initial_delay,
            period,
        }
    }

    pub fn spawn(self) -> AnnouncerHandle {
        let (shutdown, mut receiver) = watch::channel(false);
        tokio::spawn(async move {
            info!(
                identity = %self.identity,
                app_url = %self.app_url,
                "announcer started"
            );
            tokio::select! {
                _ = tokio::time::sleep(self.initial_delay) => {}
                _ = receiver.changed() => return,
            }

            let mut ticker = tokio::time::interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                if let Err(e) = self
                    .collector
                    .announce(&self.admin_url, &self.identity, &self.app_url)
                    .await
                {
                    warn!(error = %e, "announce failed, retrying next period");
                }

                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = receiver.changed() => return,
                }
            }
        });
        AnnouncerHandle { shutdown }
    }
}
