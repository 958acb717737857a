//! Periodic cycle scheduling.
//!
//! The scheduler alternates between two states: idle (waiting for the next
//! tick) and running (one cycle in progress on the blocking pool). The
//! first cycle runs immediately; after that, ticks fire at a fixed period.
//! Because the loop awaits each cycle before selecting the next tick,
//! cycles never overlap; an overlong cycle simply defers the next tick.
//! The loop exits only when the cancellation token fires; a failed or
//! panicking cycle is logged and the loop keeps going.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::sync::SyncEngine;

pub struct Scheduler {
    engine: Arc<SyncEngine>,
    period: Duration,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(engine: Arc<SyncEngine>, period: Duration, cancel: CancellationToken) -> Self {
        Self {
            engine,
            period,
            cancel,
        }
    }

    /// Run cycles until cancelled. Cancellation is checked between cycles;
    /// an in-flight cycle finishes before the loop exits.
    pub async fn run(&self) {
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let engine = Arc::clone(&self.engine);
            match tokio::task::spawn_blocking(move || engine.run_cycle()).await {
                Ok(Ok(result)) => {
                    if result.errors.is_empty() {
                        info!(
                            created = result.created,
                            updated = result.updated,
                            deleted = result.deleted,
                            "sync cycle complete"
                        );
                    } else {
                        warn!(
                            created = result.created,
                            updated = result.updated,
                            deleted = result.deleted,
                            errors = result.errors.len(),
                            "sync cycle completed with errors"
                        );
                    }
                }
                Ok(Err(e)) => {
                    // Cycle-level failure (e.g. source root unavailable):
                    // already journaled, retried on the next tick.
                    error!(error = %e, "sync cycle failed");
                }
                Err(e) => {
                    error!(error = %e, "sync cycle task panicked");
                }
            }
        }

        info!("scheduler stopped");
    }
}
