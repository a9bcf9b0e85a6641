use anyhow::{Result, bail};

use crate::coords::{Color, IntRect, Size};

/// Straight-alpha RGBA8 image, rows top to bottom, tightly packed.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    size: Size,
    data: Vec<u8>,

    /// Region touched since the last `take_modified`, if any.
    modified: Option<IntRect>,
}

impl Bitmap {
    /// Transparent bitmap of the given size.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            data: vec![0; size.pixel_count() * 4],
            modified: None,
        }
    }

    /// Wraps existing RGBA8 data.
    pub fn from_rgba8(size: Size, data: Vec<u8>) -> Result<Self> {
        let expected = size.pixel_count() * 4;
        if data.len() != expected {
            bail!(
                "bitmap data is {} bytes, expected {expected} for {}x{}",
                data.len(),
                size.width,
                size.height
            );
        }
        Ok(Self { size, data, modified: None })
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.size.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.size.height
    }

    #[inline]
    pub fn rect(&self) -> IntRect {
        IntRect::from_size(self.size)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.size.width as usize + x as usize) * 4
    }

    /// Returns `None` outside the bitmap.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = self.offset(x, y);
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Writes one pixel. Out-of-range coordinates are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.size.width || y >= self.size.height {
            return;
        }
        let i = self.offset(x, y);
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    /// Fills `rect` (clipped to the bitmap) with a solid color and marks it modified.
    pub fn fill_rect(&mut self, rect: IntRect, color: Color) {
        let Some(clip) = rect.intersect(self.rect()) else {
            return;
        };
        let rgba = color.to_rgba8();
        for y in clip.y..clip.bottom() {
            for x in clip.x..clip.right() {
                self.set_pixel(x as u32, y as u32, rgba);
            }
        }
        self.mark_modified(clip);
    }

    /// Grows the modified region to include `rect`.
    pub fn mark_modified(&mut self, rect: IntRect) {
        let Some(rect) = rect.intersect(self.rect()) else {
            return;
        };
        self.modified = Some(match self.modified {
            None => rect,
            Some(prev) => {
                let x0 = prev.x.min(rect.x);
                let y0 = prev.y.min(rect.y);
                let x1 = prev.right().max(rect.right());
                let y1 = prev.bottom().max(rect.bottom());
                IntRect::new(x0, y0, x1 - x0, y1 - y0)
            }
        });
    }

    #[inline]
    pub fn modified(&self) -> Option<IntRect> {
        self.modified
    }

    /// Returns and clears the modified region (used by texture uploads).
    pub fn take_modified(&mut self) -> Option<IntRect> {
        self.modified.take()
    }

    /// Mean of the RGB channels of one pixel, in `[0, 1]`.
    pub fn luminance(&self, x: u32, y: u32) -> f32 {
        match self.pixel(x, y) {
            Some([r, g, b, _]) => (r as f32 + g as f32 + b as f32) / (3.0 * 255.0),
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba8_checks_length() {
        assert!(Bitmap::from_rgba8(Size::new(2, 2), vec![0; 16]).is_ok());
        assert!(Bitmap::from_rgba8(Size::new(2, 2), vec![0; 15]).is_err());
    }

    #[test]
    fn pixel_access_is_bounds_checked() {
        let mut bmp = Bitmap::new(Size::new(4, 3));
        bmp.set_pixel(3, 2, [1, 2, 3, 4]);
        bmp.set_pixel(4, 0, [9, 9, 9, 9]);
        assert_eq!(bmp.pixel(3, 2), Some([1, 2, 3, 4]));
        assert_eq!(bmp.pixel(4, 0), None);
    }

    #[test]
    fn fill_rect_clips_and_marks_modified() {
        let mut bmp = Bitmap::new(Size::new(8, 8));
        bmp.fill_rect(IntRect::new(6, 6, 10, 10), Color::white());
        assert_eq!(bmp.pixel(7, 7), Some([255; 4]));
        assert_eq!(bmp.pixel(5, 5), Some([0; 4]));
        assert_eq!(bmp.modified(), Some(IntRect::new(6, 6, 2, 2)));
    }

    #[test]
    fn modified_region_is_a_union() {
        let mut bmp = Bitmap::new(Size::new(10, 10));
        bmp.mark_modified(IntRect::new(1, 1, 2, 2));
        bmp.mark_modified(IntRect::new(5, 6, 1, 1));
        assert_eq!(bmp.take_modified(), Some(IntRect::new(1, 1, 5, 6)));
        assert_eq!(bmp.modified(), None);
    }
}
