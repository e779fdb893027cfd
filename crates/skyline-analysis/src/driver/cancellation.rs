//! Shared cancellation token forwarded from the orchestrator down to every
//! running subprocess.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable cancellation handle. Cancellation is idempotent and safe to
/// fire from any adapter's post-exit handler.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// The underlying atomic, for polling loops that hold no token clone.
    pub fn as_atomic(&self) -> &AtomicBool {
        &self.flag
    }
}
