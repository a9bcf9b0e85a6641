//! Time subsystem.
//!
//! - `Timer`: monotonic tick source with a fixed frequency (swappable for tests)
//! - `FrameLimiter`: adaptive frame pacing with signed drift correction
//! - `FpsCounter`: coarse frame-rate sampling for diagnostics

mod fps_counter;
mod limiter;
mod timer;

pub use fps_counter::FpsCounter;
pub use limiter::FrameLimiter;
pub use timer::{ManualTimer, SystemTimer, Timer};
