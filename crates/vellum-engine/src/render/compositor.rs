use anyhow::Result;
use log::debug;

use crate::coords::{Color, IntRect, Size};
use crate::core::EngineCtx;
use crate::scene::{DrawTarget, Scene};

use super::{BlendMode, EffectPass, GraphicsBackend, PingPong, ScreenGeometry, SurfaceId, TintChannel};

/// One-shot full-screen effect applied after compositing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ScreenEffect {
    Gray,
    Sepia,
    Tint(TintChannel),
}

impl ScreenEffect {
    fn pass(self, source: SurfaceId) -> EffectPass {
        match self {
            ScreenEffect::Gray => EffectPass::Gray { source, strength: 1.0 },
            ScreenEffect::Sepia => EffectPass::Sepia { source },
            ScreenEffect::Tint(channel) => EffectPass::Tint { source, channel },
        }
    }
}

/// Renders the scene into the ping-pong pair.
///
/// After `composite()` the finished frame is `front()`; `back()` is free scratch
/// space until the next composite.
#[derive(Debug)]
pub struct Compositor {
    pp: PingPong,
    brightness: u8,
    smooth: bool,
}

impl Compositor {
    pub fn new(ctx: &EngineCtx, backend: &mut dyn GraphicsBackend, resolution: Size) -> Result<Self> {
        let pp = PingPong::new(backend, resolution)?;
        pp.clear_buffers(backend)?;
        Ok(Self {
            pp,
            brightness: 255,
            smooth: ctx.config().smooth_scaling,
        })
    }

    #[inline]
    pub fn front(&self) -> SurfaceId {
        self.pp.front()
    }

    #[inline]
    pub fn back(&self) -> SurfaceId {
        self.pp.back()
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.pp.size()
    }

    #[inline]
    fn screen(&self) -> IntRect {
        IntRect::from_size(self.pp.size())
    }

    /// Overlay strength comes from `255 - brightness`; 255 disables the overlay.
    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    #[inline]
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Draws the scene into the back buffer and publishes it as front.
    ///
    /// The frame is always drawn unclipped; the caller's scissor is restored.
    pub fn composite(&mut self, backend: &mut dyn GraphicsBackend, scene: &mut Scene) -> Result<()> {
        let saved = backend.scissor();
        let result = self.draw_frame(backend, scene);
        backend.set_scissor(saved);
        result
    }

    fn draw_frame(&mut self, backend: &mut dyn GraphicsBackend, scene: &mut Scene) -> Result<()> {
        scene.prepare_all();

        backend.set_scissor(None);
        backend.clear(self.pp.back(), Color::black())?;
        {
            let mut target = DrawTarget::new(backend, &mut self.pp);
            scene.draw_all(&mut target)?;
        }
        // Drawables are expected to restore the scissor; do not trust them.
        backend.set_scissor(None);

        if self.brightness < 255 {
            let alpha = 1.0 - f32::from(self.brightness) / 255.0;
            let overlay = Color::black().with_alpha(alpha);
            backend.fill_rect(self.pp.back(), self.screen(), overlay, BlendMode::Normal)?;
        }

        self.pp.swap();
        Ok(())
    }

    /// Composites, then runs `effect` over the whole frame.
    pub fn composite_with_effect(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        scene: &mut Scene,
        effect: ScreenEffect,
    ) -> Result<()> {
        debug!("compositing with {effect:?}");
        let saved = backend.scissor();
        let result = self
            .composite(backend, scene)
            .and_then(|()| self.apply_effect(backend, effect));
        backend.set_scissor(saved);
        result
    }

    /// Front to back through `effect`, then swap. Prior scissor state is restored.
    pub fn apply_effect(&mut self, backend: &mut dyn GraphicsBackend, effect: ScreenEffect) -> Result<()> {
        let screen = self.screen();
        let saved = backend.scissor();

        // A partial scissor would leave stale pixels in the target; start from a
        // full copy of the frame.
        if saved.is_some_and(|rect| !rect.encloses(screen)) {
            backend.blit(self.pp.front(), screen, self.pp.back(), screen.origin())?;
        }

        backend.set_scissor(Some(screen));
        let result = backend.draw_effect(self.pp.back(), &effect.pass(self.pp.front()));
        backend.set_scissor(saved);
        result?;

        self.pp.swap();
        Ok(())
    }

    /// Copies the current front buffer into `target` (same size).
    pub fn copy_front_to(&self, backend: &mut dyn GraphicsBackend, target: SurfaceId) -> Result<()> {
        let screen = self.screen();
        backend.blit(self.pp.front(), screen, target, screen.origin())
    }

    /// Draws `source` letterboxed into the window frame.
    pub fn present(
        &self,
        backend: &mut dyn GraphicsBackend,
        source: SurfaceId,
        geometry: &ScreenGeometry,
    ) -> Result<()> {
        backend.blit_to_window(source, geometry.display_rect(), geometry.window(), self.smooth)
    }

    /// Content of both buffers is undefined afterwards.
    pub fn resize(&mut self, backend: &mut dyn GraphicsBackend, size: Size) -> Result<()> {
        self.pp.resize(backend, size)
    }

    pub fn clear_buffers(&self, backend: &mut dyn GraphicsBackend) -> Result<()> {
        self.pp.clear_buffers(backend)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::GraphicsConfig;
    use crate::render::SoftwareBackend;
    use crate::scene::ColorPlane;
    use crate::sync::ThreadSignals;
    use crate::time::ManualTimer;

    fn setup() -> (SoftwareBackend, Compositor, Scene) {
        let ctx = EngineCtx::new(
            Arc::new(GraphicsConfig::default()),
            Arc::new(ThreadSignals::new()),
            Arc::new(ManualTimer::new(1000)),
        );
        let mut backend = SoftwareBackend::new();
        let comp = Compositor::new(&ctx, &mut backend, Size::new(8, 4)).unwrap();
        (backend, comp, Scene::new())
    }

    fn front_px(backend: &mut SoftwareBackend, comp: &Compositor, x: u32, y: u32) -> [u8; 4] {
        backend.read_pixels(comp.front()).unwrap().pixel(x, y).unwrap()
    }

    // ── composite ─────────────────────────────────────────────────────────

    #[test]
    fn composite_publishes_scene_to_front() {
        let (mut backend, mut comp, mut scene) = setup();
        scene.insert(Box::new(ColorPlane::new(Some(IntRect::new(0, 0, 4, 4)), Color::white(), 0)));

        comp.composite(&mut backend, &mut scene).unwrap();
        assert_eq!(front_px(&mut backend, &comp, 0, 0), [255; 4]);
        assert_eq!(front_px(&mut backend, &comp, 7, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn composite_clears_previous_frame() {
        let (mut backend, mut comp, mut scene) = setup();
        let h = scene.insert(Box::new(ColorPlane::full_screen(Color::white(), 0)));
        comp.composite(&mut backend, &mut scene).unwrap();
        comp.composite(&mut backend, &mut scene).unwrap();

        scene.remove(h);
        comp.composite(&mut backend, &mut scene).unwrap();
        assert_eq!(front_px(&mut backend, &comp, 3, 3), [0, 0, 0, 255]);
    }

    #[test]
    fn brightness_darkens_frame() {
        let (mut backend, mut comp, mut scene) = setup();
        scene.insert(Box::new(ColorPlane::full_screen(Color::white(), 0)));

        comp.set_brightness(0);
        comp.composite(&mut backend, &mut scene).unwrap();
        assert_eq!(front_px(&mut backend, &comp, 1, 1), [0, 0, 0, 255]);

        comp.set_brightness(255);
        comp.composite(&mut backend, &mut scene).unwrap();
        assert_eq!(front_px(&mut backend, &comp, 1, 1), [255; 4]);
    }

    // ── effects ───────────────────────────────────────────────────────────

    #[test]
    fn gray_effect_covers_whole_frame() {
        let (mut backend, mut comp, mut scene) = setup();
        scene.insert(Box::new(ColorPlane::full_screen(Color::new(1.0, 0.0, 0.0, 1.0), 0)));

        comp.composite_with_effect(&mut backend, &mut scene, ScreenEffect::Gray).unwrap();
        assert_eq!(front_px(&mut backend, &comp, 0, 0), [76, 76, 76, 255]);
        assert_eq!(front_px(&mut backend, &comp, 7, 3), [76, 76, 76, 255]);
    }

    #[test]
    fn effect_restores_partial_scissor_and_keeps_full_frame() {
        let (mut backend, mut comp, mut scene) = setup();
        scene.insert(Box::new(ColorPlane::full_screen(Color::white(), 0)));
        comp.composite(&mut backend, &mut scene).unwrap();

        let partial = Some(IntRect::new(0, 0, 2, 2));
        backend.set_scissor(partial);
        comp.apply_effect(&mut backend, ScreenEffect::Tint(TintChannel::Red)).unwrap();

        assert_eq!(backend.scissor(), partial);
        assert_eq!(front_px(&mut backend, &comp, 7, 3), [255, 0, 0, 255]);
    }

    #[test]
    fn composite_with_effect_keeps_callers_scissor() {
        let (mut backend, mut comp, mut scene) = setup();
        scene.insert(Box::new(ColorPlane::full_screen(Color::new(1.0, 0.0, 0.0, 1.0), 0)));

        let partial = Some(IntRect::new(0, 0, 2, 2));
        backend.set_scissor(partial);
        comp.composite_with_effect(&mut backend, &mut scene, ScreenEffect::Gray).unwrap();

        assert_eq!(backend.scissor(), partial);
        // The effect still saw the whole frame.
        assert_eq!(front_px(&mut backend, &comp, 7, 3), [76, 76, 76, 255]);
    }

    #[test]
    fn composite_draws_unclipped_and_restores_scissor() {
        let (mut backend, mut comp, mut scene) = setup();
        scene.insert(Box::new(ColorPlane::full_screen(Color::white(), 0)));

        let partial = Some(IntRect::new(1, 1, 2, 2));
        backend.set_scissor(partial);
        comp.composite(&mut backend, &mut scene).unwrap();

        assert_eq!(backend.scissor(), partial);
        assert_eq!(front_px(&mut backend, &comp, 7, 3), [255; 4]);
    }
}
