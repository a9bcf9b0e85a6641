//! Core engine-facing contracts.
//!
//! - `EngineCtx`: explicit context passed to each component at construction
//! - `GraphicsError`: the error surface of facade operations

mod ctx;
mod error;

pub use ctx::EngineCtx;
pub use error::{GraphicsError, GraphicsResult};
