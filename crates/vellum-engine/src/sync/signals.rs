use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::{GraphicsError, GraphicsResult};

use super::{ResizeMailbox, SyncPoint};

/// Process-wide control flags shared by the event thread and the render thread.
#[derive(Debug, Default)]
pub struct ThreadSignals {
    terminate: AtomicBool,
    terminate_ack: AtomicBool,
    reset: AtomicBool,

    /// Pause gate (application suspended).
    pub sync: SyncPoint,

    /// Latest window size reported by the event thread.
    pub resize: ResizeMailbox,
}

impl ThreadSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests termination. Also opens the pause gate so a suspended render
    /// thread can observe the request.
    pub fn request_terminate(&self) {
        self.terminate.store(true, Ordering::Release);
        self.sync.unlock();
    }

    pub fn terminate_requested(&self) -> bool {
        self.terminate.load(Ordering::Acquire)
    }

    /// Called by the render thread once it has unwound after a termination request.
    pub fn acknowledge_terminate(&self) {
        self.terminate_ack.store(true, Ordering::Release);
    }

    pub fn terminate_acknowledged(&self) -> bool {
        self.terminate_ack.load(Ordering::Acquire)
    }

    pub fn request_reset(&self) {
        self.reset.store(true, Ordering::Release);
    }

    pub fn reset_requested(&self) -> bool {
        self.reset.load(Ordering::Acquire)
    }

    pub fn clear_reset(&self) {
        self.reset.store(false, Ordering::Release);
    }

    /// Polls both flags. Termination wins over reset.
    pub fn check(&self) -> GraphicsResult<()> {
        if self.terminate_requested() {
            return Err(GraphicsError::Shutdown);
        }
        if self.reset_requested() {
            return Err(GraphicsError::Reset);
        }
        Ok(())
    }
}
