/// Size of a surface, a resolution or a window, in pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Clamps both dimensions into `[1, max]` componentwise.
    #[inline]
    pub fn clamped(self, max: Size) -> Self {
        Self {
            width: self.width.clamp(1, max.width.max(1)),
            height: self.height.clamp(1, max.height.max(1)),
        }
    }

    #[inline]
    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Width over height. Returns 1.0 for degenerate sizes.
    #[inline]
    pub fn aspect(self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}
