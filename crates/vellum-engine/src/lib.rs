//! Vellum engine crate.
//!
//! Graphics core of a 2D game runtime: an offscreen compositor with screen
//! effects, frame pacing, freeze/transition/fade, letterboxed presentation and
//! snapshots. The game loop drives a [`Graphics`] facade on its own thread;
//! the window event loop lives in [`window::Runtime`].

pub mod bitmap;
pub mod config;
pub mod coords;
pub mod core;
pub mod device;
pub mod graphics;
pub mod logging;
pub mod registry;
pub mod render;
pub mod scene;
pub mod sync;
pub mod time;
pub mod window;

pub use crate::config::GraphicsConfig;
pub use crate::core::{GraphicsError, GraphicsResult};
pub use crate::graphics::Graphics;
pub use crate::window::Runtime;
