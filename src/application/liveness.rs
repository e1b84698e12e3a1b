//! Liveness monitor - periodic reclamation of silent connections.
//!
//! A connection that has produced no traffic within the idle timeout is a
//! zombie: its transport may still look open, but the peer is gone. Each
//! sweep closes zombies with the stale-session code and removes their
//! registry entries in the same pass. Eviction is advisory cleanup, not
//! correctness-critical; frames racing with it are absorbed elsewhere.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::domain::foundation::Timestamp;
use crate::ports::CloseReason;

use super::registry::ConnectionRegistry;

/// Background task that sweeps the registry for zombie connections.
pub struct LivenessMonitor {
    registry: Arc<ConnectionRegistry>,
    scan_interval: Duration,
    idle_timeout: Duration,
}

impl LivenessMonitor {
    /// Creates a monitor over the given registry.
    ///
    /// `idle_timeout` is expected to be at least `scan_interval`
    /// (configuration validation enforces this).
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        scan_interval: Duration,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            scan_interval,
            idle_timeout,
        }
    }

    /// Runs the sweep loop until the shutdown signal flips to true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.scan_interval);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::debug!("liveness monitor stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    self.sweep().await;
                }
            }
        }
    }

    /// Scans a registry snapshot once; returns the number of evictions.
    ///
    /// This method is also the test entry point for sweep behavior.
    pub async fn sweep(&self) -> usize {
        let now_ms = Timestamp::now().unix_millis();
        let idle_limit_ms = self.idle_timeout.as_millis() as i64;
        let mut evicted = 0;

        for handle in self.registry.snapshot().await {
            let idle_ms = handle.idle_millis(now_ms);
            if idle_ms <= idle_limit_ms {
                continue;
            }

            tracing::warn!(
                user_id = %handle.user(),
                connection_id = %handle.id(),
                idle_ms,
                "closing stale connection"
            );
            if let Err(e) = handle.close(CloseReason::StaleSession) {
                tracing::error!(user_id = %handle.user(), error = %e, "failed to close stale connection");
            }
            // Entry and connection are reclaimed together, even when the
            // close itself failed.
            self.registry.remove(&handle).await;
            evicted += 1;
        }

        evicted
    }
}
