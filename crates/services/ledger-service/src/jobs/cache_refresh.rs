//! Periodic cache refresh.
//!
//! Runs `refresh_caches` once shortly after start, then on a fixed interval,
//! until shutdown is requested. A failed refresh is logged and retried on
//! the next tick; the caches keep their previous contents meanwhile.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};

use common::CacheRefreshConfig;

use crate::service::UserAccountService;

/// Handle to the running refresh task.
pub struct CacheRefreshJob {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl CacheRefreshJob {
    /// Spawn the refresh loop on the current runtime.
    pub fn spawn(service: Arc<dyn UserAccountService>, config: &CacheRefreshConfig) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let initial_delay = Duration::from_millis(config.initial_delay_ms);
        let period = Duration::from_secs(config.interval_secs.max(1));

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = sleep(initial_delay) => {}
                _ = shutdown_rx.changed() => return,
            }

            tracing::info!(interval_secs = period.as_secs(), "Cache refresh job started");

            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = service.refresh_caches().await {
                            tracing::error!(error = %e, "Cache refresh failed");
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }

            tracing::info!("Cache refresh job stopped");
        });

        Self { handle, shutdown }
    }

    /// Stop the loop and wait for an in-flight refresh to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            tracing::error!("Cache refresh job panicked: {}", e);
        }
    }
}
