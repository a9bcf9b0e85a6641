use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::coords::Size;

/// Frame rate restored by `Graphics::reset`.
pub const DEFAULT_FRAME_RATE: i32 = 60;

/// Bounds applied by `Graphics::set_frame_rate`.
pub const MIN_FRAME_RATE: i32 = 10;
pub const MAX_FRAME_RATE: i32 = 120;

/// Largest render resolution the engine accepts.
pub const MAX_RESOLUTION: Size = Size::new(1920, 1080);

/// Encoding used for screenshots.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotFormat {
    #[default]
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
}

impl ScreenshotFormat {
    #[inline]
    pub fn extension(self) -> &'static str {
        match self {
            ScreenshotFormat::Png => "png",
            ScreenshotFormat::Jpg => "jpg",
        }
    }
}

/// Graphics configuration.
///
/// `fixed_frame_rate` follows the classic convention:
/// - `0` uses the script-controlled frame rate
/// - `> 0` pins the limiter to that rate
/// - `< 0` disables the limiter (uncapped)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    pub title: String,

    pub start_width: u32,
    pub start_height: u32,

    pub window_width: u32,
    pub window_height: u32,

    /// Letterbox the rendered image instead of stretching it to the window.
    pub fixed_aspect_ratio: bool,

    /// Linear filtering when scaling to the window.
    pub smooth_scaling: bool,

    /// Pace with the display refresh instead of the limiter.
    pub sync_to_refresh_rate: bool,

    pub fixed_frame_rate: i32,

    /// Skip presentation when the limiter falls more than a frame behind.
    pub frame_skip: bool,

    pub screenshot_dir: PathBuf,
    pub screenshot_name: String,
    pub screenshot_format: ScreenshotFormat,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            title: "vellum".to_string(),
            start_width: 640,
            start_height: 480,
            window_width: 640,
            window_height: 480,
            fixed_aspect_ratio: true,
            smooth_scaling: false,
            sync_to_refresh_rate: false,
            fixed_frame_rate: 0,
            frame_skip: true,
            screenshot_dir: PathBuf::from("screenshots"),
            screenshot_name: "screenshot".to_string(),
            screenshot_format: ScreenshotFormat::Png,
        }
    }
}

impl GraphicsConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(src: &str) -> Result<Self> {
        toml::from_str(src).context("invalid graphics configuration")
    }

    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&src)
    }

    /// Initial render resolution, clamped to the engine maximum.
    pub fn start_resolution(&self) -> Size {
        Size::new(self.start_width, self.start_height).clamped(MAX_RESOLUTION)
    }

    pub fn window_size(&self) -> Size {
        Size::new(self.window_width.max(1), self.window_height.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = GraphicsConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, GraphicsConfig::default());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let cfg = GraphicsConfig::from_toml_str(
            r#"
            start_width = 800
            start_height = 600
            frame_skip = false
            screenshot_format = "jpeg"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.start_resolution(), Size::new(800, 600));
        assert!(!cfg.frame_skip);
        assert_eq!(cfg.screenshot_format, ScreenshotFormat::Jpg);
        assert!(cfg.fixed_aspect_ratio);
    }

    #[test]
    fn start_resolution_is_clamped() {
        let cfg = GraphicsConfig { start_width: 10_000, start_height: 0, ..Default::default() };
        assert_eq!(cfg.start_resolution(), Size::new(MAX_RESOLUTION.width, 1));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(GraphicsConfig::from_toml_str("screenshot_format = \"gif\"").is_err());
    }
}
