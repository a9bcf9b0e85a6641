//! Render-thread / event-thread communication.
//!
//! The event thread only ever writes these; the render thread polls them once per
//! loop iteration. Nothing else is shared between the two threads.

mod mailbox;
mod signals;
mod sync_point;

pub use mailbox::ResizeMailbox;
pub use signals::ThreadSignals;
pub use sync_point::SyncPoint;
