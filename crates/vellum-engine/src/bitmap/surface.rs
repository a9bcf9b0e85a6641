use anyhow::Result;

use crate::render::{GraphicsBackend, SurfaceId};

use super::Bitmap;

impl Bitmap {
    /// Copies a backend surface into a new bitmap whose full extent is marked
    /// modified, so the next upload sends every pixel.
    pub fn from_surface(backend: &mut dyn GraphicsBackend, surface: SurfaceId) -> Result<Self> {
        let mut bitmap = backend.read_pixels(surface)?;
        bitmap.mark_modified(bitmap.rect());
        Ok(bitmap)
    }
}
