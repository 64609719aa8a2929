use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "busy" flag read by the render layer and written only by the
/// upload handler.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag {
    busy: Arc<AtomicBool>,
}

impl LoadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Sets the flag and returns a guard that clears it on drop.
    /// Returns `None` if the flag is already held.
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard {
                busy: self.busy.clone(),
            })
    }
}

/// Clears the loading flag when dropped, on every exit path.
#[derive(Debug)]
pub struct BusyGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
