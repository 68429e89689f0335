use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative stop signal for a running search.
///
/// Clones share the same flag, so a controller thread can keep one clone and
/// cancel the search that owns another. The search polls the flag between
/// node expansions; it never interrupts chunk generation already under way.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that every search observing this token stop.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Clears the flag so the token can be reused for another search.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}
