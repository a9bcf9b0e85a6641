//! Stable-handle storage.
//!
//! - `Registry<T>`: generational arena (slot reuse via a free list)
//! - `Handle`: slot index + generation; stale handles never resolve
//! - `Disposables`: registry of engine-managed resources released on reset

mod arena;
mod disposable;
mod handle;

pub use arena::Registry;
pub use disposable::{Disposable, Disposables};
pub use handle::Handle;
