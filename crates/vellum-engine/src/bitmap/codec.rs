use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::config::ScreenshotFormat;
use crate::coords::Size;

use super::Bitmap;

const JPEG_QUALITY: u8 = 95;

impl Bitmap {
    /// Decodes an image file into RGBA8.
    pub fn load(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("failed to decode image {}", path.display()))?
            .to_rgba8();
        let size = Size::new(img.width(), img.height());
        Bitmap::from_rgba8(size, img.into_raw())
    }

    /// Encodes the bitmap to `path`.
    pub fn save(&self, path: &Path, format: ScreenshotFormat) -> Result<()> {
        let img = RgbaImage::from_raw(self.width(), self.height(), self.as_bytes().to_vec())
            .context("bitmap size does not match its pixel data")?;

        match format {
            ScreenshotFormat::Png => img
                .save_with_format(path, ImageFormat::Png)
                .with_context(|| format!("failed to write {}", path.display())),
            ScreenshotFormat::Jpg => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                // JPEG has no alpha channel.
                let rgb = DynamicImage::ImageRgba8(img).to_rgb8();
                JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY)
                    .encode_image(&rgb)
                    .with_context(|| format!("failed to encode {}", path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Color, IntRect};

    #[test]
    fn png_round_trip_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");

        let mut bmp = Bitmap::new(Size::new(3, 2));
        bmp.fill_rect(IntRect::new(0, 0, 1, 2), Color::from_rgba8(10, 20, 30, 255));
        bmp.save(&path, ScreenshotFormat::Png).unwrap();

        let back = Bitmap::load(&path).unwrap();
        assert_eq!(back.size(), Size::new(3, 2));
        assert_eq!(back.pixel(0, 1), Some([10, 20, 30, 255]));
        assert_eq!(back.pixel(2, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn jpeg_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.jpg");

        let mut bmp = Bitmap::new(Size::new(8, 8));
        bmp.fill_rect(bmp.rect(), Color::white());
        bmp.save(&path, ScreenshotFormat::Jpg).unwrap();

        let back = Bitmap::load(&path).unwrap();
        assert_eq!(back.size(), Size::new(8, 8));
    }

    #[test]
    fn load_missing_file_fails_with_path() {
        let err = Bitmap::load(Path::new("/nonexistent/map.png")).unwrap_err();
        assert!(format!("{err:#}").contains("map.png"));
    }
}
