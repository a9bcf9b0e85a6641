use anyhow::Result;

use crate::bitmap::Bitmap;
use crate::coords::{Color, IntRect, Vec2i};
use crate::render::{BlendMode, GraphicsBackend, ScreenGeometry, SurfaceId};

use super::{DrawTarget, Drawable, ViewportEffects};

/// Solid rectangle. `None` covers the whole screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorPlane {
    pub rect: Option<IntRect>,
    pub color: Color,
    pub z: i32,
    pub visible: bool,
}

impl ColorPlane {
    pub fn new(rect: Option<IntRect>, color: Color, z: i32) -> Self {
        Self { rect, color, z, visible: true }
    }

    pub fn full_screen(color: Color, z: i32) -> Self {
        Self::new(None, color, z)
    }
}

impl Drawable for ColorPlane {
    fn z(&self) -> i32 {
        self.z
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn draw(&mut self, target: &mut DrawTarget<'_>) -> Result<()> {
        let rect = self.rect.unwrap_or(target.screen_rect());
        target.fill(rect, self.color, BlendMode::Normal)
    }
}

/// A bitmap drawn at a position, uploaded lazily on first draw.
pub struct Picture {
    bitmap: Bitmap,
    surface: Option<SurfaceId>,
    pub position: Vec2i,
    pub opacity: f32,
    pub z: i32,
}

impl Picture {
    pub fn new(bitmap: Bitmap, position: Vec2i, z: i32) -> Self {
        Self { bitmap, surface: None, position, opacity: 1.0, z }
    }

    /// Replaces the pixels; the texture is re-uploaded on the next draw.
    pub fn set_bitmap(&mut self, bitmap: Bitmap) {
        self.bitmap = bitmap;
        self.bitmap.mark_modified(self.bitmap.rect());
    }
}

impl Drawable for Picture {
    fn z(&self) -> i32 {
        self.z
    }

    fn draw(&mut self, target: &mut DrawTarget<'_>) -> Result<()> {
        let stale = self.bitmap.take_modified().is_some();
        let surface = match self.surface {
            Some(id) if !stale => id,
            previous => {
                if let Some(id) = previous {
                    target.backend().destroy_surface(id);
                }
                let id = target.backend().upload_bitmap(&self.bitmap)?;
                self.surface = Some(id);
                id
            }
        };

        let src = self.bitmap.rect();
        let dst = IntRect::new(self.position.x, self.position.y, src.w, src.h);
        target.draw_texture(surface, src, dst, self.opacity)
    }

    fn release(&mut self, backend: &mut dyn GraphicsBackend) {
        if let Some(id) = self.surface.take() {
            backend.destroy_surface(id);
        }
    }
}

/// Viewport-like layer: applies tone/color/flash over a screen region.
///
/// Follows the render resolution when created with `rect: None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenTone {
    pub rect: Option<IntRect>,
    pub effects: ViewportEffects,
    pub z: i32,
}

impl ScreenTone {
    pub fn new(rect: Option<IntRect>, effects: ViewportEffects, z: i32) -> Self {
        Self { rect, effects, z }
    }
}

impl Drawable for ScreenTone {
    fn z(&self) -> i32 {
        self.z
    }

    fn draw(&mut self, target: &mut DrawTarget<'_>) -> Result<()> {
        let rect = self.rect.unwrap_or(target.screen_rect());
        let effects = self.effects;
        target.with_scissor(rect, |t| t.apply_viewport_effects(&effects))
    }

    fn on_geometry_changed(&mut self, geometry: &ScreenGeometry) {
        // Keep explicit regions inside the new resolution.
        if let Some(rect) = self.rect {
            let screen = IntRect::from_size(geometry.resolution());
            self.rect = Some(rect.intersect(screen).unwrap_or_default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Size;
    use crate::render::{PingPong, SoftwareBackend};
    use crate::scene::Tone;

    #[test]
    fn picture_uploads_once_and_releases() {
        let mut backend = SoftwareBackend::new();
        let mut pp = PingPong::new(&mut backend, Size::new(4, 4)).unwrap();

        let mut bmp = Bitmap::new(Size::new(2, 2));
        bmp.fill_rect(bmp.rect(), Color::white());
        let mut pic = Picture::new(bmp, Vec2i::new(1, 1), 0);

        for _ in 0..3 {
            let mut target = DrawTarget::new(&mut backend, &mut pp);
            pic.draw(&mut target).unwrap();
        }
        assert_eq!(backend.surface_count(), 3);

        let out = backend.read_pixels(pp.back()).unwrap();
        assert_eq!(out.pixel(2, 2), Some([255; 4]));
        assert_eq!(out.pixel(0, 0), Some([0, 0, 0, 255]));

        pic.release(&mut backend);
        assert_eq!(backend.surface_count(), 2);
    }

    #[test]
    fn screen_tone_region_shrinks_with_resolution() {
        let fx = ViewportEffects { tone: Tone::new(0.0, 0.0, 0.0, 0.5), ..Default::default() };
        let mut tone = ScreenTone::new(Some(IntRect::new(100, 100, 400, 300)), fx, 0);

        let geometry = ScreenGeometry::new(Size::new(320, 240), Size::new(320, 240), true);
        tone.on_geometry_changed(&geometry);
        assert_eq!(tone.rect, Some(IntRect::new(100, 100, 220, 140)));
    }
}
