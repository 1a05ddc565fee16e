//! Lifecycle controller
//!
//! Owns the cancellation token shared by the producer and consumer loops.
//! Stop is cooperative: each loop observes the token at its await points.

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Stop switch shared by every pipeline task
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    token: CancellationToken,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token handed to a loop; cancelled by `request_stop`
    pub fn cancel_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Ask every loop to stop; idempotent
    pub fn request_stop(&self) {
        if !self.token.is_cancelled() {
            info!("stop requested");
            self.token.cancel();
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once stop has been requested
    pub async fn stopped(&self) {
        self.token.cancelled().await
    }
}
