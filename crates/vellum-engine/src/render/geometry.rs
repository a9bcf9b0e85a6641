use crate::coords::{IntRect, Size, Vec2i};

/// Mapping between the render resolution and the window.
///
/// - `resolution`: size the scene is composited at
/// - `window`: physical size of the game window
/// - `display`: size the frame is scaled to inside the window (smaller than the
///   window on one axis when the aspect ratio is fixed)
/// - `offset`: top-left of the display area inside the window
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenGeometry {
    resolution: Size,
    window: Size,
    display: Size,
    offset: Vec2i,
    fixed_aspect: bool,
}

impl ScreenGeometry {
    pub fn new(resolution: Size, window: Size, fixed_aspect: bool) -> Self {
        let mut geometry = Self {
            resolution,
            window,
            display: window,
            offset: Vec2i::new(0, 0),
            fixed_aspect,
        };
        geometry.recalculate();
        geometry
    }

    #[inline]
    pub fn resolution(&self) -> Size {
        self.resolution
    }

    #[inline]
    pub fn window(&self) -> Size {
        self.window
    }

    #[inline]
    pub fn display(&self) -> Size {
        self.display
    }

    #[inline]
    pub fn offset(&self) -> Vec2i {
        self.offset
    }

    #[inline]
    pub fn fixed_aspect(&self) -> bool {
        self.fixed_aspect
    }

    /// Area of the window the frame is blitted into.
    pub fn display_rect(&self) -> IntRect {
        IntRect::new(
            self.offset.x,
            self.offset.y,
            self.display.width as i32,
            self.display.height as i32,
        )
    }

    /// Render pixels per window pixel, per axis.
    pub fn size_reso_ratio(&self) -> (f32, f32) {
        (
            self.resolution.width as f32 / self.display.width.max(1) as f32,
            self.resolution.height as f32 / self.display.height.max(1) as f32,
        )
    }

    /// Maps a window-space point (e.g. the mouse) to render-resolution pixels.
    pub fn window_to_render(&self, p: Vec2i) -> Vec2i {
        let (rx, ry) = self.size_reso_ratio();
        let local = p - self.offset;
        Vec2i::new((local.x as f32 * rx) as i32, (local.y as f32 * ry) as i32)
    }

    /// Returns true if the window size actually changed.
    pub fn set_window(&mut self, window: Size) -> bool {
        if window.is_empty() || window == self.window {
            return false;
        }
        self.window = window;
        self.recalculate();
        true
    }

    pub fn set_resolution(&mut self, resolution: Size) {
        self.resolution = resolution;
        self.recalculate();
    }

    /// Recomputes the display size and letterbox offset.
    fn recalculate(&mut self) {
        self.display = self.window;
        self.offset = Vec2i::new(0, 0);

        if !self.fixed_aspect || self.window.is_empty() {
            return;
        }

        let res_ratio = self.resolution.aspect();
        let win_ratio = self.window.aspect();

        if res_ratio > win_ratio {
            self.display.height = ((self.window.width as f32 / res_ratio) as u32).max(1);
        } else if res_ratio < win_ratio {
            self.display.width = ((self.window.height as f32 * res_ratio) as u32).max(1);
        }

        self.offset = Vec2i::new(
            (self.window.width - self.display.width) as i32 / 2,
            (self.window.height - self.display.height) as i32 / 2,
        );
    }
}
