use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use log::{debug, info};

use crate::bitmap::Bitmap;
use crate::config::ScreenshotFormat;
use crate::core::GraphicsResult;
use crate::render::{GraphicsBackend, ScreenEffect, TintChannel};
use crate::window::WindowHandle;

use super::{Graphics, ScreenshotTarget};

impl<B: GraphicsBackend, W: WindowHandle> Graphics<B, W> {
    /// Composites the scene and copies it into a new bitmap.
    pub fn snap_to_bitmap(&mut self) -> GraphicsResult<Bitmap> {
        self.snapshot(None)
    }

    pub fn snap_to_gray_bitmap(&mut self) -> GraphicsResult<Bitmap> {
        self.snapshot(Some(ScreenEffect::Gray))
    }

    pub fn snap_to_sepia_bitmap(&mut self) -> GraphicsResult<Bitmap> {
        self.snapshot(Some(ScreenEffect::Sepia))
    }

    /// `channel`: 0 red, 1 green, 2 blue, 3 yellow.
    pub fn snap_to_color_bitmap(&mut self, channel: i32) -> GraphicsResult<Bitmap> {
        self.snapshot(Some(ScreenEffect::Tint(TintChannel::from_index(channel))))
    }

    fn snapshot(&mut self, effect: Option<ScreenEffect>) -> GraphicsResult<Bitmap> {
        match effect {
            Some(effect) => {
                self.compositor
                    .composite_with_effect(&mut self.backend, &mut self.scene, effect)?
            }
            None => self.compositor.composite(&mut self.backend, &mut self.scene)?,
        }
        Ok(Bitmap::from_surface(&mut self.backend, self.compositor.front())?)
    }

    #[inline]
    pub fn screenshot_target(&self) -> &ScreenshotTarget {
        &self.screenshot
    }

    pub fn set_screenshot_dir(&mut self, dir: impl Into<PathBuf>) {
        self.screenshot.dir = dir.into();
    }

    pub fn set_screenshot_name(&mut self, name: impl Into<String>) {
        self.screenshot.name = name.into();
    }

    pub fn set_screenshot_format(&mut self, format: ScreenshotFormat) {
        self.screenshot.format = format;
    }

    /// Writes a snapshot to `{dir}/{name}_{YYYY-MM-DD}_{HH}h{MM}m{SS}s.{ext}`
    /// and returns the path.
    ///
    /// The timestamp is UTC, not local time.
    pub fn save_screenshot(&mut self) -> GraphicsResult<PathBuf> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        let target = self.screenshot.clone();
        let path = target.dir.join(screenshot_file_name(&target.name, secs, target.format));

        let bitmap = self.snap_to_bitmap()?;
        write_screenshot(&bitmap, &target.dir, &path, target.format)?;

        info!("screenshot saved to {}", path.display());
        Ok(path)
    }
}

fn write_screenshot(
    bitmap: &Bitmap,
    dir: &Path,
    path: &Path,
    format: ScreenshotFormat,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create screenshot directory {}", dir.display()))?;
    debug!("encoding {}x{} screenshot", bitmap.width(), bitmap.height());
    bitmap.save(path, format)
}

fn screenshot_file_name(name: &str, unix_secs: u64, format: ScreenshotFormat) -> String {
    let (year, month, day) = civil_from_days((unix_secs / 86_400) as i64);
    let secs_of_day = unix_secs % 86_400;
    format!(
        "{name}_{year}-{month:02}-{day:02}_{:02}h{:02}m{:02}s.{}",
        secs_of_day / 3600,
        secs_of_day % 3600 / 60,
        secs_of_day % 60,
        format.extension(),
    )
}

/// Proleptic Gregorian date of a day count since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
