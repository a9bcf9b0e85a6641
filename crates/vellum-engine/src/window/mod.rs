//! Window collaborator.
//!
//! The render thread only sees `WindowHandle`; the winit event loop lives in
//! `Runtime` on the main thread and talks back through `ThreadSignals`.

mod handle;
mod headless;
mod runtime;

pub use handle::{Hotkey, WindowHandle};
pub use headless::HeadlessWindow;
pub use runtime::{Runtime, RuntimeEvent, WindowedGraphics, WinitWindow};
