//! Engine configuration.
//!
//! Every field has a default so partial TOML files are accepted.

mod graphics;

pub use graphics::{
    DEFAULT_FRAME_RATE, GraphicsConfig, MAX_FRAME_RATE, MAX_RESOLUTION, MIN_FRAME_RATE,
    ScreenshotFormat,
};
