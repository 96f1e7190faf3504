//! Periodic execution of collection passes.

use crate::collector::MetricsCollector;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Runs a collection pass immediately and then once per interval.
///
/// Passes never overlap: a pass that outlasts the interval delays the next
/// tick instead of queueing a burst of catch-up passes.
pub struct Scheduler {
    collector: Arc<MetricsCollector>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(collector: Arc<MetricsCollector>, interval: Duration) -> Self {
        Self {
            collector,
            interval,
        }
    }

    /// Runs until the shutdown channel changes or its sender is dropped.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "Scheduler started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Scheduler received shutdown signal.");
                    break;
                }
                _ = ticker.tick() => {
                    debug!("Starting collection pass");
                    self.collector.collect_once().await;
                }
            }
        }
        info!("Scheduler finished.");
    }
}
