use anyhow::Result;

use crate::coords::{Color, IntRect};
use crate::render::{BlendMode, EffectPass, GraphicsBackend, PingPong, SurfaceId};

/// Tone adjustment: signed RGB shift in `[-1, 1]` and gray amount in `[0, 1]`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Tone {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub gray: f32,
}

impl Tone {
    pub const fn new(r: f32, g: f32, b: f32, gray: f32) -> Self {
        Self { r, g, b, gray }
    }

    #[inline]
    pub fn rgb_is_zero(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0
    }
}

/// Screen-space effects applied over everything drawn so far, inside the scissor.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ViewportEffects {
    pub tone: Tone,
    /// Blended with its alpha.
    pub color: Color,
    /// Blended with its alpha, after `color`.
    pub flash: Color,
}

/// Drawing surface handed to `Drawable::draw`.
///
/// Wraps the back buffer of the ping-pong pair. Viewport effects may swap the
/// pair mid-frame, so drawables must not cache `surface()` across calls.
pub struct DrawTarget<'a> {
    backend: &'a mut dyn GraphicsBackend,
    pp: &'a mut PingPong,
    screen: IntRect,
}

impl<'a> DrawTarget<'a> {
    pub(crate) fn new(backend: &'a mut dyn GraphicsBackend, pp: &'a mut PingPong) -> Self {
        let screen = IntRect::from_size(pp.size());
        Self { backend, pp, screen }
    }

    /// Surface currently being drawn.
    #[inline]
    pub fn surface(&self) -> SurfaceId {
        self.pp.back()
    }

    #[inline]
    pub fn screen_rect(&self) -> IntRect {
        self.screen
    }

    #[inline]
    pub fn backend(&mut self) -> &mut dyn GraphicsBackend {
        &mut *self.backend
    }

    pub fn fill(&mut self, rect: IntRect, color: Color, blend: BlendMode) -> Result<()> {
        let target = self.pp.back();
        self.backend.fill_rect(target, rect, color, blend)
    }

    pub fn draw_texture(
        &mut self,
        source: SurfaceId,
        src_rect: IntRect,
        dst_rect: IntRect,
        opacity: f32,
    ) -> Result<()> {
        let target = self.pp.back();
        self.backend
            .draw_texture(target, source, src_rect, dst_rect, opacity, BlendMode::Normal)
    }

    /// Runs `f` with the scissor narrowed to `rect`, restoring it afterwards.
    pub fn with_scissor<F>(&mut self, rect: IntRect, f: F) -> Result<()>
    where
        F: FnOnce(&mut DrawTarget<'a>) -> Result<()>,
    {
        let saved = self.backend.scissor();
        let clip = match saved {
            Some(parent) => parent.intersect(rect).unwrap_or_default(),
            None => rect,
        };
        self.backend.set_scissor(Some(clip));
        let result = f(self);
        self.backend.set_scissor(saved);
        result
    }

    /// Applies tone, color and flash over the current scissor region.
    pub fn apply_viewport_effects(&mut self, fx: &ViewportEffects) -> Result<()> {
        if fx.tone.gray != 0.0 {
            self.apply_gray_tone(fx.tone.gray)?;
        }

        let screen = self.screen;
        let tone = fx.tone;
        if !tone.rgb_is_zero() {
            let add = Color::new(tone.r.max(0.0), tone.g.max(0.0), tone.b.max(0.0), 1.0);
            let sub = Color::new((-tone.r).max(0.0), (-tone.g).max(0.0), (-tone.b).max(0.0), 1.0);
            if !add.rgb_is_zero() {
                self.fill(screen, add, BlendMode::Add)?;
            }
            if !sub.rgb_is_zero() {
                self.fill(screen, sub, BlendMode::ReverseSubtract)?;
            }
        }

        if fx.color.a > 0.0 {
            self.fill(screen, fx.color, BlendMode::Normal)?;
        }
        if fx.flash.a > 0.0 {
            self.fill(screen, fx.flash, BlendMode::Normal)?;
        }
        Ok(())
    }

    /// Gray needs to sample what was drawn, so the pair is swapped and the
    /// result is written into the other buffer.
    fn apply_gray_tone(&mut self, strength: f32) -> Result<()> {
        self.pp.swap();
        let (drawn, target) = (self.pp.front(), self.pp.back());

        // Outside the scissor the new target must still hold the frame.
        let covers_screen = match self.backend.scissor() {
            Some(rect) => rect.encloses(self.screen),
            None => true,
        };
        if !covers_screen {
            self.backend.blit(drawn, self.screen, target, self.screen.origin())?;
        }

        let pass = EffectPass::Gray { source: drawn, strength };
        self.backend.draw_effect(target, &pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Size;
    use crate::render::SoftwareBackend;

    fn setup(color: Color) -> (SoftwareBackend, PingPong) {
        let mut backend = SoftwareBackend::new();
        let pp = PingPong::new(&mut backend, Size::new(4, 2)).unwrap();
        backend.clear(pp.back(), color).unwrap();
        (backend, pp)
    }

    fn back_px(backend: &mut SoftwareBackend, pp: &PingPong, x: u32, y: u32) -> [u8; 4] {
        backend.read_pixels(pp.back()).unwrap().pixel(x, y).unwrap()
    }

    #[test]
    fn gray_tone_inside_viewport_keeps_rest_of_frame() {
        let (mut backend, mut pp) = setup(Color::new(1.0, 0.0, 0.0, 1.0));
        {
            let mut target = DrawTarget::new(&mut backend, &mut pp);
            target
                .with_scissor(IntRect::new(0, 0, 2, 2), |t| {
                    t.apply_viewport_effects(&ViewportEffects {
                        tone: Tone::new(0.0, 0.0, 0.0, 1.0),
                        ..Default::default()
                    })
                })
                .unwrap();
        }

        // Left half grayed, right half copied over untouched.
        assert_eq!(back_px(&mut backend, &pp, 0, 0), [76, 76, 76, 255]);
        assert_eq!(back_px(&mut backend, &pp, 3, 1), [255, 0, 0, 255]);
        assert_eq!(backend.scissor(), None);
    }

    #[test]
    fn rgb_tone_adds_and_subtracts() {
        let (mut backend, mut pp) = setup(Color::new(0.5, 0.5, 0.5, 1.0));
        {
            let mut target = DrawTarget::new(&mut backend, &mut pp);
            let fx = ViewportEffects { tone: Tone::new(0.25, -0.25, 0.0, 0.0), ..Default::default() };
            target.apply_viewport_effects(&fx).unwrap();
        }
        assert_eq!(back_px(&mut backend, &pp, 0, 0), [192, 64, 128, 255]);
    }

    #[test]
    fn flash_blends_over_color() {
        let (mut backend, mut pp) = setup(Color::black());
        {
            let mut target = DrawTarget::new(&mut backend, &mut pp);
            let fx = ViewportEffects {
                color: Color::new(1.0, 0.0, 0.0, 0.0),
                flash: Color::new(1.0, 1.0, 1.0, 1.0),
                ..Default::default()
            };
            target.apply_viewport_effects(&fx).unwrap();
        }
        assert_eq!(back_px(&mut backend, &pp, 1, 1), [255; 4]);
    }

    #[test]
    fn nested_scissor_intersects_and_restores() {
        let (mut backend, mut pp) = setup(Color::black());
        let mut target = DrawTarget::new(&mut backend, &mut pp);
        target
            .with_scissor(IntRect::new(0, 0, 3, 2), |outer| {
                outer.with_scissor(IntRect::new(2, 0, 2, 2), |inner| {
                    assert_eq!(inner.backend().scissor(), Some(IntRect::new(2, 0, 1, 2)));
                    Ok(())
                })?;
                assert_eq!(outer.backend().scissor(), Some(IntRect::new(0, 0, 3, 2)));
                Ok(())
            })
            .unwrap();
        assert_eq!(target.backend().scissor(), None);
    }
}
