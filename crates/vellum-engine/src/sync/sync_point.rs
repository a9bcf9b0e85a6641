use std::sync::{Condvar, Mutex, PoisonError};

/// Pause gate between the event thread and the render thread.
///
/// The event thread locks it while the application is suspended; the render
/// thread blocks in [`SyncPoint::wait_while_locked`] until it is unlocked again.
#[derive(Debug, Default)]
pub struct SyncPoint {
    locked: Mutex<bool>,
    changed: Condvar,
}

impl SyncPoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) {
        *self.locked.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    pub fn unlock(&self) {
        *self.locked.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.changed.notify_all();
    }

    pub fn is_locked(&self) -> bool {
        *self.locked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks while locked. Returns `true` if the caller actually waited.
    pub fn wait_while_locked(&self) -> bool {
        let guard = self.locked.lock().unwrap_or_else(PoisonError::into_inner);
        if !*guard {
            return false;
        }
        let _guard = self
            .changed
            .wait_while(guard, |locked| *locked)
            .unwrap_or_else(PoisonError::into_inner);
        true
    }
}
