//! Cooperative cancellation for long reads.

use crate::error::{PropertyError, PropertyResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails with `Cancelled` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self, operation: &str) -> PropertyResult<()> {
        if self.is_cancelled() {
            return Err(PropertyError::cancelled(operation));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_flag() {
        let token = Cancellation::new();
        let other = token.clone();
        assert!(token.check("walk").is_ok());
        other.cancel();
        assert!(matches!(
            token.check("walk"),
            Err(PropertyError::Cancelled { .. })
        ));
    }
}
