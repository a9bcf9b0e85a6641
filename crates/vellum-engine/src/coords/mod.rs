//! Integer pixel geometry shared by the compositor, the backends and scene drawables.
//!
//! Canonical space:
//! - physical pixels of the render resolution (or of the window for presentation)
//! - origin top-left
//! - +X right, +Y down

mod color;
mod rect;
mod size;
mod vec2;

pub use color::Color;
pub use rect::IntRect;
pub use size::Size;
pub use vec2::Vec2i;
