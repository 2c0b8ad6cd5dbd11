use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::services::dispatch::Dispatcher;

/// Periodic dispatch trigger with an explicit lifecycle: constructed and
/// started by the process's startup routine, stopped before exit. No global
/// scheduler handle, no start-once guard.
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    pub fn start(dispatcher: Arc<Dispatcher>, interval: Duration) -> Self {
        let (shutdown, mut rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // A pass that overruns the tick must not cause a burst afterwards.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match dispatcher.run().await {
                            Ok(summary) => tracing::info!(
                                sent = summary.sent,
                                skipped = summary.skipped,
                                failed = summary.failed,
                                "dispatch pass finished"
                            ),
                            // Store-level failure; the next tick is the retry.
                            Err(e) => tracing::warn!(error = %e, "dispatch pass aborted"),
                        }
                    }
                    _ = rx.changed() => break,
                }
            }
        });
        Scheduler { shutdown, handle }
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}
