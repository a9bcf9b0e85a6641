//! Scene graph consumed by the compositor.
//!
//! Responsibilities:
//! - store drawables behind stable handles
//! - provide deterministic paint order (z + insertion order)
//! - expose a `DrawTarget` with fill/texture/scissor helpers and viewport effects

mod drawable;
mod key;
mod list;
mod planes;
mod target;

pub use drawable::Drawable;
pub use list::Scene;
pub use planes::{ColorPlane, Picture, ScreenTone};
pub use target::{DrawTarget, Tone, ViewportEffects};
