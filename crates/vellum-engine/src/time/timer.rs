use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic tick source.
pub trait Timer: Send + Sync {
    /// Ticks per second.
    fn frequency(&self) -> u64;

    /// Current tick count.
    fn now(&self) -> u64;

    /// Suspends the calling thread for approximately `ticks`.
    fn sleep(&self, ticks: u64);
}

/// Wall-clock timer with nanosecond ticks.
#[derive(Debug, Clone)]
pub struct SystemTimer {
    origin: Instant,
}

impl SystemTimer {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for SystemTimer {
    fn frequency(&self) -> u64 {
        1_000_000_000
    }

    fn now(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn sleep(&self, ticks: u64) {
        if ticks > 0 {
            thread::sleep(Duration::from_nanos(ticks));
        }
    }
}

/// Deterministic timer: time only moves through `sleep` and `advance`.
///
/// `sleep` wakes up exactly on time, which models an ideal scheduler.
#[derive(Debug)]
pub struct ManualTimer {
    frequency: u64,
    now: AtomicU64,
}

impl ManualTimer {
    pub fn new(frequency: u64) -> Self {
        Self { frequency, now: AtomicU64::new(0) }
    }

    /// Moves time forward, e.g. to simulate frame work or a stall.
    pub fn advance(&self, ticks: u64) {
        self.now.fetch_add(ticks, Ordering::AcqRel);
    }
}

impl Timer for ManualTimer {
    fn frequency(&self) -> u64 {
        self.frequency
    }

    fn now(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }

    fn sleep(&self, ticks: u64) {
        self.advance(ticks);
    }
}
