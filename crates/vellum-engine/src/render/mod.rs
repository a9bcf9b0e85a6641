//! Rendering subsystem.
//!
//! Everything above this module talks to a `GraphicsBackend`: the wgpu backend
//! in production and the CPU rasterizer in tests.
//!
//! Convention:
//! - geometry is in render-resolution pixels (top-left origin, +Y down)
//! - the scissor is backend state and clips fills, textured draws and effects,
//!   never clears or blits

mod backend;
mod compositor;
mod geometry;
mod gpu;
mod ping_pong;
mod software;

pub use backend::{BlendMode, EffectPass, GraphicsBackend, SurfaceId, TintChannel};
pub use compositor::{Compositor, ScreenEffect};
pub use geometry::ScreenGeometry;
pub use gpu::WgpuBackend;
pub use ping_pong::PingPong;
pub use software::SoftwareBackend;
