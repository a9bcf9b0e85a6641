use anyhow::Result;

use crate::render::{GraphicsBackend, ScreenGeometry};

use super::DrawTarget;

/// A scene entry that the compositor draws once per frame.
///
/// Entries are drawn in ascending `z()`; equal values keep insertion order.
pub trait Drawable {
    fn z(&self) -> i32 {
        0
    }

    fn visible(&self) -> bool {
        true
    }

    /// Per-frame hook, called for every entry before any entry draws.
    fn prepare(&mut self) {}

    fn draw(&mut self, target: &mut DrawTarget<'_>) -> Result<()>;

    /// The render resolution or window mapping changed.
    fn on_geometry_changed(&mut self, _geometry: &ScreenGeometry) {}

    /// Frees backend resources. Called when the entry leaves the scene.
    fn release(&mut self, _backend: &mut dyn GraphicsBackend) {}
}
