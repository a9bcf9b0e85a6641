use core::fmt;

use anyhow::Result;

use crate::bitmap::Bitmap;
use crate::coords::{Color, IntRect, Size, Vec2i};

/// Opaque handle to an off-screen RGBA8 render surface owned by a backend.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

/// How a draw combines with the target.
///
/// Alpha of the target is preserved by `Add` and `ReverseSubtract`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// `src * a + dst * (1 - a)`
    #[default]
    Normal,
    /// `dst + src * a`
    Add,
    /// `dst - src * a`
    ReverseSubtract,
    /// `src`
    Replace,
}

/// Channel selector for the single-channel tint effect.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TintChannel {
    Red,
    Green,
    Blue,
    Yellow,
}

impl TintChannel {
    /// Maps the classic script index: 0 red, 1 green, 2 blue, anything else yellow.
    pub fn from_index(index: i32) -> Self {
        match index {
            0 => TintChannel::Red,
            1 => TintChannel::Green,
            2 => TintChannel::Blue,
            _ => TintChannel::Yellow,
        }
    }

    pub fn color(self) -> Color {
        match self {
            TintChannel::Red => Color::new(1.0, 0.0, 0.0, 1.0),
            TintChannel::Green => Color::new(0.0, 1.0, 0.0, 1.0),
            TintChannel::Blue => Color::new(0.0, 0.0, 1.0, 1.0),
            TintChannel::Yellow => Color::new(0.85, 0.85, 0.0, 1.0),
        }
    }
}

/// A full-surface shader program with its operands.
///
/// Every pass samples its sources at the same pixel it writes (sources and target
/// share the render resolution) and replaces the target inside the scissor.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum EffectPass {
    /// Mix towards luminance by `strength` in `[0, 1]`.
    Gray { source: SurfaceId, strength: f32 },
    Sepia { source: SurfaceId },
    /// Luminance multiplied by a single channel color.
    Tint { source: SurfaceId, channel: TintChannel },
    /// Uniform cross-fade: `mix(frozen, current, progress)`.
    SimpleTransition { frozen: SurfaceId, current: SurfaceId, progress: f32 },
    /// Wipe ordered by map luminance with edge softness `vague` in `(0, 1]`.
    ///
    /// `t = (clamp(map, progress, progress + vague) - progress) / vague`,
    /// output `mix(current, frozen, t)`.
    MapTransition {
        frozen: SurfaceId,
        current: SurfaceId,
        map: SurfaceId,
        vague: f32,
        progress: f32,
    },
}

impl EffectPass {
    pub fn name(&self) -> &'static str {
        match self {
            EffectPass::Gray { .. } => "gray",
            EffectPass::Sepia { .. } => "sepia",
            EffectPass::Tint { .. } => "tint",
            EffectPass::SimpleTransition { .. } => "transition",
            EffectPass::MapTransition { .. } => "map transition",
        }
    }

    /// Transition progress, if this is a transition pass.
    pub fn progress(&self) -> Option<f32> {
        match *self {
            EffectPass::SimpleTransition { progress, .. }
            | EffectPass::MapTransition { progress, .. } => Some(progress),
            _ => None,
        }
    }
}

/// Drawing and presentation primitives used by the compositor.
///
/// GL-like state model: a single scissor rectangle applies to `fill_rect`,
/// `draw_texture` and `draw_effect` on any target. `clear` and `blit` ignore it.
/// Presentation draws into the pending window frame, `swap_window` shows it.
pub trait GraphicsBackend {
    /// Allocates a surface. Initial content is opaque black.
    fn create_surface(&mut self, size: Size) -> Result<SurfaceId>;

    /// Reallocates a surface. Content becomes undefined.
    fn resize_surface(&mut self, id: SurfaceId, size: Size) -> Result<()>;

    fn destroy_surface(&mut self, id: SurfaceId);

    fn surface_size(&self, id: SurfaceId) -> Option<Size>;

    /// Creates a surface holding a copy of `bitmap`.
    fn upload_bitmap(&mut self, bitmap: &Bitmap) -> Result<SurfaceId>;

    /// Fills the whole surface.
    fn clear(&mut self, target: SurfaceId, color: Color) -> Result<()>;

    fn fill_rect(
        &mut self,
        target: SurfaceId,
        rect: IntRect,
        color: Color,
        blend: BlendMode,
    ) -> Result<()>;

    /// Scaled textured quad with `opacity` in `[0, 1]`.
    fn draw_texture(
        &mut self,
        target: SurfaceId,
        source: SurfaceId,
        src_rect: IntRect,
        dst_rect: IntRect,
        opacity: f32,
        blend: BlendMode,
    ) -> Result<()>;

    /// 1:1 pixel copy between two distinct surfaces.
    fn blit(
        &mut self,
        source: SurfaceId,
        src_rect: IntRect,
        target: SurfaceId,
        dst_pos: Vec2i,
    ) -> Result<()>;

    fn draw_effect(&mut self, target: SurfaceId, pass: &EffectPass) -> Result<()>;

    /// `None` means the scissor test is off.
    fn scissor(&self) -> Option<IntRect>;

    fn set_scissor(&mut self, rect: Option<IntRect>);

    /// Copies a surface back to the CPU.
    fn read_pixels(&mut self, source: SurfaceId) -> Result<Bitmap>;

    /// Draws `source` scaled into `dst_rect` of the window frame, letterbox area black.
    fn blit_to_window(
        &mut self,
        source: SurfaceId,
        dst_rect: IntRect,
        window_size: Size,
        smooth: bool,
    ) -> Result<()>;

    /// Presents the pending window frame.
    fn swap_window(&mut self) -> Result<()>;
}
