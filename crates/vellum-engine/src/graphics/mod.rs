//! Graphics facade.
//!
//! `Graphics` is the state machine games talk to. It owns the compositor, the
//! frozen snapshot, the frame limiter, the scene and the disposable registry,
//! and sequences them per frame:
//!
//! - `Running`: `update()` composites and presents one frame
//! - `Frozen`: entered by `freeze()`, left when `transition()` completes;
//!   `update()` draws nothing
//!
//! Blocking operations (`wait`, `fadein`, `fadeout`, `transition`,
//! `repaint_wait`) poll the thread signals once per iteration.

mod frame;
mod screenshot;
mod transition;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

use log::{debug, info};

use crate::config::{DEFAULT_FRAME_RATE, MAX_FRAME_RATE, MAX_RESOLUTION, MIN_FRAME_RATE, ScreenshotFormat};
use crate::coords::Size;
use crate::core::{EngineCtx, GraphicsResult};
use crate::registry::{Disposable, Disposables, Handle};
use crate::render::{Compositor, GraphicsBackend, ScreenGeometry, SurfaceId};
use crate::scene::Scene;
use crate::time::FrameLimiter;
use crate::window::{Hotkey, WindowHandle};

/// Where and how `save_screenshot` writes.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenshotTarget {
    pub dir: PathBuf,
    pub name: String,
    pub format: ScreenshotFormat,
}

pub struct Graphics<B: GraphicsBackend, W: WindowHandle> {
    ctx: EngineCtx,
    backend: B,
    window: W,

    compositor: Compositor,
    geometry: ScreenGeometry,

    /// Snapshot captured by `freeze()`. Only meaningful while `frozen`.
    frozen_surface: SurfaceId,
    frozen: bool,

    limiter: FrameLimiter,
    frame_rate: i32,
    frame_count: i64,

    scene: Scene,
    disposables: Disposables,
    screenshot: ScreenshotTarget,
}

impl<B: GraphicsBackend, W: WindowHandle> Graphics<B, W> {
    pub fn new(ctx: EngineCtx, mut backend: B, window: W, window_size: Size) -> GraphicsResult<Self> {
        let config = ctx.config();
        let resolution = clamp_resolution(config.start_width as i64, config.start_height as i64);

        let compositor = Compositor::new(&ctx, &mut backend, resolution)?;
        let frozen_surface = backend.create_surface(resolution)?;
        let geometry = ScreenGeometry::new(resolution, window_size, config.fixed_aspect_ratio);

        let screenshot = ScreenshotTarget {
            dir: config.screenshot_dir.clone(),
            name: config.screenshot_name.clone(),
            format: config.screenshot_format,
        };

        let mut limiter = FrameLimiter::new(&ctx, DEFAULT_FRAME_RATE as u32);
        limiter.reset_frame_adjust();

        let mut graphics = Self {
            ctx,
            backend,
            window,
            compositor,
            geometry,
            frozen_surface,
            frozen: false,
            limiter,
            frame_rate: DEFAULT_FRAME_RATE,
            frame_count: 0,
            scene: Scene::new(),
            disposables: Disposables::new(),
            screenshot,
        };
        graphics.apply_pacing_policy();

        info!(
            "graphics ready: {}x{} render, {}x{} window, {} fps{}",
            resolution.width,
            resolution.height,
            window_size.width,
            window_size.height,
            graphics.frame_rate,
            if graphics.limiter.is_disabled() { " (limiter off)" } else { "" },
        );
        Ok(graphics)
    }

    /// Refresh sync and fixed frame rates take the limiter out of script control.
    fn apply_pacing_policy(&mut self) {
        let config = self.ctx.config();
        if config.sync_to_refresh_rate {
            self.frame_rate = self.window.refresh_rate().map_or(DEFAULT_FRAME_RATE, |hz| hz as i32);
            self.limiter.set_disabled(true);
        } else if config.fixed_frame_rate > 0 {
            self.limiter.set_desired_fps(config.fixed_frame_rate as u32);
        } else if config.fixed_frame_rate < 0 {
            self.limiter.set_disabled(true);
        }
    }

    // -- Frame rate and counters --

    #[inline]
    pub fn frame_rate(&self) -> i32 {
        self.frame_rate
    }

    /// Clamped to [10, 120]. The limiter only follows when the frame rate is
    /// script controlled.
    pub fn set_frame_rate(&mut self, value: i32) {
        self.frame_rate = value.clamp(MIN_FRAME_RATE, MAX_FRAME_RATE);

        let config = self.ctx.config();
        if config.sync_to_refresh_rate || config.fixed_frame_rate > 0 {
            return;
        }
        self.limiter.set_desired_fps(self.frame_rate as u32);
    }

    #[inline]
    pub fn frame_count(&self) -> i64 {
        self.frame_count
    }

    pub fn set_frame_count(&mut self, value: i64) {
        self.frame_count = value;
    }

    /// Drops accumulated pacing drift, e.g. after a long load.
    pub fn frame_reset(&mut self) {
        self.limiter.reset_frame_adjust();
    }

    #[inline]
    pub fn limiter(&self) -> &FrameLimiter {
        &self.limiter
    }

    // -- Screen --

    #[inline]
    pub fn width(&self) -> u32 {
        self.compositor.size().width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.compositor.size().height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    #[inline]
    pub fn geometry(&self) -> &ScreenGeometry {
        &self.geometry
    }

    /// Changes the render resolution, clamped to [1, engine maximum].
    ///
    /// Both compositor buffers and the frozen snapshot are reallocated, so their
    /// content is undefined until the next composite.
    pub fn resize_screen(&mut self, width: i32, height: i32) -> GraphicsResult<()> {
        let size = clamp_resolution(width.into(), height.into());
        if size == self.compositor.size() {
            return Ok(());
        }

        info!("render resolution {}x{} -> {}x{}", self.width(), self.height(), size.width, size.height);
        self.compositor.resize(&mut self.backend, size)?;
        self.backend.resize_surface(self.frozen_surface, size)?;

        self.geometry.set_resolution(size);
        self.scene.notify_geometry_changed(&self.geometry);
        self.window.request_resize(size);
        Ok(())
    }

    // -- Brightness --

    #[inline]
    pub fn brightness(&self) -> i32 {
        i32::from(self.compositor.brightness())
    }

    pub fn set_brightness(&mut self, value: i32) {
        self.compositor.set_brightness(value.clamp(0, 255) as u8);
    }

    // -- State --

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Returns to `Running` with default frame rate and brightness.
    ///
    /// Every registered disposable is disposed and every scene entry released.
    /// The frame count is kept.
    pub fn reset(&mut self) -> GraphicsResult<()> {
        let disposed = self.disposables.dispose_all();
        let drawables = self.scene.len();
        self.scene.clear(&mut self.backend);

        self.limiter.reset_frame_adjust();
        self.frozen = false;
        self.compositor.clear_buffers(&mut self.backend)?;
        self.set_frame_rate(DEFAULT_FRAME_RATE);
        self.set_brightness(255);

        self.ctx.signals().clear_reset();
        info!("graphics reset ({disposed} disposables, {drawables} drawables released)");
        Ok(())
    }

    // -- Window collaborator --

    pub fn is_fullscreen(&self) -> bool {
        self.window.is_fullscreen()
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.window.set_fullscreen(fullscreen);
    }

    pub fn show_cursor(&self) -> bool {
        self.window.cursor_visible()
    }

    pub fn set_show_cursor(&mut self, visible: bool) {
        self.window.set_cursor_visible(visible);
    }

    pub fn hotkey_blocked(&self, hotkey: Hotkey) -> bool {
        self.window.hotkey_blocked(hotkey)
    }

    pub fn set_hotkey_blocked(&mut self, hotkey: Hotkey, blocked: bool) {
        debug!("hotkey {hotkey:?} blocked: {blocked}");
        self.window.set_hotkey_blocked(hotkey, blocked);
    }

    #[inline]
    pub fn window(&self) -> &W {
        &self.window
    }

    // -- Scene and resources --

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn register_disposable(&mut self, item: Box<dyn Disposable>) -> Handle {
        self.disposables.register(item)
    }

    pub fn unregister_disposable(&mut self, handle: Handle) -> Option<Box<dyn Disposable>> {
        self.disposables.unregister(handle)
    }

    #[inline]
    pub fn disposable_count(&self) -> usize {
        self.disposables.len()
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn ctx(&self) -> &EngineCtx {
        &self.ctx
    }
}

fn clamp_resolution(width: i64, height: i64) -> Size {
    Size::new(
        width.clamp(1, i64::from(MAX_RESOLUTION.width)) as u32,
        height.clamp(1, i64::from(MAX_RESOLUTION.height)) as u32,
    )
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::testing::{Harness, small_config};
    use super::*;
    use crate::config::GraphicsConfig;
    use crate::scene::{DrawTarget, Drawable};
    use crate::window::HeadlessWindow;

    struct Counted(Rc<Cell<usize>>);

    impl Disposable for Counted {
        fn dispose(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    /// Records the render resolution of every geometry notification.
    struct GeometryWatcher(Rc<RefCell<Vec<Size>>>);

    impl Drawable for GeometryWatcher {
        fn draw(&mut self, _target: &mut DrawTarget<'_>) -> anyhow::Result<()> {
            Ok(())
        }

        fn on_geometry_changed(&mut self, geometry: &ScreenGeometry) {
            self.0.borrow_mut().push(geometry.resolution());
        }
    }

    // ── brightness ────────────────────────────────────────────────────────

    #[test]
    fn brightness_is_clamped() {
        let mut h = Harness::new();
        h.gfx.set_brightness(-10);
        assert_eq!(h.gfx.brightness(), 0);
        h.gfx.set_brightness(999);
        assert_eq!(h.gfx.brightness(), 255);
    }

    // ── frame rate ────────────────────────────────────────────────────────

    #[test]
    fn frame_rate_is_clamped_and_drives_limiter() {
        let mut h = Harness::new();
        h.gfx.set_frame_rate(5);
        assert_eq!(h.gfx.frame_rate(), 10);
        h.gfx.set_frame_rate(500);
        assert_eq!(h.gfx.frame_rate(), 120);
        assert_eq!(h.gfx.limiter().ticks_per_frame(), Harness::FREQ as i64 / 120);
    }

    #[test]
    fn fixed_frame_rate_pins_limiter() {
        let config = GraphicsConfig { fixed_frame_rate: 30, ..small_config() };
        let mut h = Harness::with(config, HeadlessWindow::new());

        assert_eq!(h.gfx.limiter().ticks_per_frame(), Harness::FREQ as i64 / 30);
        h.gfx.set_frame_rate(90);
        assert_eq!(h.gfx.frame_rate(), 90);
        assert_eq!(h.gfx.limiter().ticks_per_frame(), Harness::FREQ as i64 / 30);
    }

    #[test]
    fn refresh_sync_uses_display_rate_and_disables_limiter() {
        let config = GraphicsConfig { sync_to_refresh_rate: true, ..small_config() };
        let h = Harness::with(config, HeadlessWindow::new().with_refresh_rate(75));

        assert_eq!(h.gfx.frame_rate(), 75);
        assert!(h.gfx.limiter().is_disabled());
    }

    #[test]
    fn negative_fixed_rate_uncaps() {
        let config = GraphicsConfig { fixed_frame_rate: -1, ..small_config() };
        let h = Harness::with(config, HeadlessWindow::new());
        assert!(h.gfx.limiter().is_disabled());
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_clamps_to_engine_bounds() {
        let mut h = Harness::new();
        h.gfx.resize_screen(5000, 0).unwrap();

        assert_eq!(h.gfx.dimensions(), (1920, 1));
        assert_eq!(h.gfx.window().resize_requests(), &[Size::new(1920, 1)]);
        assert_eq!(h.gfx.geometry().resolution(), Size::new(1920, 1));
    }

    #[test]
    fn resize_to_current_resolution_is_a_noop() {
        let mut h = Harness::new();
        let (w, hgt) = h.gfx.dimensions();
        let before = h.gfx.backend().allocations();

        h.gfx.resize_screen(w as i32, hgt as i32).unwrap();

        assert_eq!(h.gfx.backend().allocations(), before);
        assert!(h.gfx.window().resize_requests().is_empty());
    }

    #[test]
    fn resize_reallocates_buffers_and_snapshot() {
        let mut h = Harness::new();
        let before = h.gfx.backend().allocations();
        h.gfx.resize_screen(8, 8).unwrap();
        assert_eq!(h.gfx.backend().allocations(), before + 3);
    }

    #[test]
    fn resize_notifies_drawables_once() {
        let mut h = Harness::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        h.gfx.scene_mut().insert(Box::new(GeometryWatcher(Rc::clone(&seen))));

        h.gfx.resize_screen(20, 10).unwrap();
        assert_eq!(*seen.borrow(), vec![Size::new(20, 10)]);

        h.gfx.resize_screen(20, 10).unwrap();
        assert_eq!(seen.borrow().len(), 1);
    }

    // ── reset ─────────────────────────────────────────────────────────────

    #[test]
    fn reset_disposes_everything_and_restores_defaults() {
        let mut h = Harness::new();
        let disposed = Rc::new(Cell::new(0));
        for _ in 0..3 {
            h.gfx.register_disposable(Box::new(Counted(Rc::clone(&disposed))));
        }
        h.gfx.set_frame_rate(30);
        h.gfx.set_brightness(100);
        h.gfx.freeze().unwrap();
        h.signals.request_reset();

        h.gfx.reset().unwrap();

        assert_eq!(disposed.get(), 3);
        assert_eq!(h.gfx.disposable_count(), 0);
        assert_eq!(h.gfx.frame_rate(), DEFAULT_FRAME_RATE);
        assert_eq!(h.gfx.brightness(), 255);
        assert!(!h.gfx.is_frozen());
        assert!(!h.signals.reset_requested());
    }

    #[test]
    fn unregistered_disposable_survives_reset() {
        let mut h = Harness::new();
        let disposed = Rc::new(Cell::new(0));
        let handle = h.gfx.register_disposable(Box::new(Counted(Rc::clone(&disposed))));
        h.gfx.register_disposable(Box::new(Counted(Rc::clone(&disposed))));

        assert!(h.gfx.unregister_disposable(handle).is_some());
        h.gfx.reset().unwrap();
        assert_eq!(disposed.get(), 1);
    }

    #[test]
    fn reset_keeps_frame_count() {
        let mut h = Harness::new();
        h.gfx.set_frame_count(42);
        h.gfx.reset().unwrap();
        assert_eq!(h.gfx.frame_count(), 42);
    }

    #[test]
    fn frame_reset_drops_accumulated_drift() {
        let mut h = Harness::new();
        h.gfx.update().unwrap();
        h.timer.advance(5000);
        h.gfx.update().unwrap();
        assert!(h.gfx.limiter().ideal_drift() > 0);

        h.gfx.frame_reset();
        h.gfx.update().unwrap();
        assert_eq!(h.gfx.limiter().ideal_drift(), 0);
        assert!(!h.gfx.limiter().frame_skip_required());
    }

    // ── window toggles ────────────────────────────────────────────────────

    #[test]
    fn window_toggles_are_forwarded() {
        let mut h = Harness::new();
        h.gfx.set_fullscreen(true);
        h.gfx.set_show_cursor(false);
        h.gfx.set_hotkey_blocked(Hotkey::Reset, true);

        assert!(h.gfx.is_fullscreen());
        assert!(!h.gfx.show_cursor());
        assert!(h.gfx.hotkey_blocked(Hotkey::Reset));
        assert!(!h.gfx.hotkey_blocked(Hotkey::Fullscreen));
    }
}
