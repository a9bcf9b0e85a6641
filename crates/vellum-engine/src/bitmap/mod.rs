//! CPU-side RGBA8 pixel buffers.
//!
//! Bitmaps are the data sink of snapshots and screenshots and the source of
//! transition maps. Pixel manipulation beyond what the compositor needs lives
//! elsewhere.

mod codec;
mod pixels;
mod surface;

pub use pixels::Bitmap;
