//! Graceful shutdown handling for SIGTERM and SIGINT.
//!
//! Ensures that:
//! - A running sync cycle is allowed to complete
//! - The journal records the interruption
//! - The scheduler exits cleanly instead of being killed mid-copy

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Shutdown coordinator
pub struct ShutdownCoordinator {
    cancel: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
        }
    }

    /// The cancellation token shared with the scheduler.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for a shutdown signal (SIGTERM or SIGINT), then cancel the
    /// shared token.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            }
            _ = terminate => {
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
        }

        self.cancel.cancel();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_observes_cancellation() {
        let coordinator = ShutdownCoordinator::new();
        let token = coordinator.token();
        assert!(!token.is_cancelled());

        let handle = tokio::spawn(async move {
            token.cancelled().await;
        });

        coordinator.cancel.cancel();
        handle.await.unwrap();
    }
}
