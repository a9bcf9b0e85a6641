use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::core::{GraphicsError, GraphicsResult};
use crate::render::{GraphicsBackend, SurfaceId};
use crate::window::WindowHandle;

use super::Graphics;

impl<B: GraphicsBackend, W: WindowHandle> Graphics<B, W> {
    /// Advances one frame: composites the scene and presents it, paced by the
    /// limiter. Draws nothing while frozen.
    pub fn update(&mut self) -> GraphicsResult<()> {
        self.check_signals()?;
        self.check_sync_point();

        if self.frozen {
            return Ok(());
        }

        if self.limiter.frame_skip_required() {
            if self.ctx.config().frame_skip {
                self.limiter.delay();
                self.frame_count += 1;
                self.window.notify_frame();
                return Ok(());
            }
            self.limiter.reset_frame_adjust();
        }

        self.check_resize();
        self.redraw_screen()
    }

    /// Captures the current scene into the frozen snapshot and enters `Frozen`.
    pub fn freeze(&mut self) -> GraphicsResult<()> {
        self.frozen = true;
        self.check_signals()?;
        self.check_resize();

        self.compositor.composite(&mut self.backend, &mut self.scene)?;
        self.compositor.copy_front_to(&mut self.backend, self.frozen_surface)?;
        debug!("frozen at frame {}", self.frame_count);
        Ok(())
    }

    /// Presents `duration` frames.
    pub fn wait(&mut self, duration: i32) -> GraphicsResult<()> {
        for _ in 0..duration {
            self.check_signals()?;
            if self.frozen {
                self.present(self.frozen_surface)?;
            } else {
                self.redraw_screen()?;
            }
        }
        Ok(())
    }

    /// Ramps brightness linearly down to 0 over `duration` frames.
    pub fn fadeout(&mut self, duration: i32) -> GraphicsResult<()> {
        let from = self.brightness();
        self.fade(duration, |i| ramp(from, 0, i, duration))
    }

    /// Ramps brightness linearly up to 255 over `duration` frames.
    pub fn fadein(&mut self, duration: i32) -> GraphicsResult<()> {
        let from = self.brightness();
        self.fade(duration, |i| ramp(from, 255, i, duration))
    }

    fn fade<F>(&mut self, duration: i32, level: F) -> GraphicsResult<()>
    where
        F: Fn(i32) -> i32,
    {
        for i in 1..=duration {
            self.set_brightness(level(i));
            if self.frozen {
                // The scene is not drawn while frozen; show the snapshot instead.
                self.check_signals()?;
                self.present(self.frozen_surface)?;
            } else {
                self.update()?;
            }
        }
        Ok(())
    }

    /// Re-presents the last published frame until `exit` is set.
    ///
    /// Used while the game thread is blocked on something slow; termination is
    /// always honored, reset only when `check_reset` is true.
    pub fn repaint_wait(&mut self, exit: &AtomicBool, check_reset: bool) -> GraphicsResult<()> {
        let last = self.compositor.front();
        while !exit.load(Ordering::Acquire) {
            let signals = self.ctx.signals();
            if signals.terminate_requested() {
                return Err(GraphicsError::Shutdown);
            }
            if check_reset && signals.reset_requested() {
                return Err(GraphicsError::Reset);
            }

            self.compositor.present(&mut self.backend, last, &self.geometry)?;
            self.backend.swap_window()?;
            self.limiter.delay();
            self.window.notify_frame();
        }
        Ok(())
    }

    // -- Frame plumbing --

    pub(super) fn check_signals(&self) -> GraphicsResult<()> {
        self.ctx.signals().check()
    }

    /// Blocks while the event thread holds the pause gate.
    pub(super) fn check_sync_point(&mut self) {
        if self.ctx.signals().sync.wait_while_locked() {
            self.limiter.reset_frame_adjust();
        }
    }

    /// Applies the latest window size posted by the event thread.
    pub(super) fn check_resize(&mut self) {
        let Some(size) = self.ctx.signals().resize.take() else {
            return;
        };
        if self.geometry.set_window(size) {
            debug!("window resized to {}x{}", size.width, size.height);
            self.window.notify_screen_change(self.geometry.display_rect());
        }
    }

    fn redraw_screen(&mut self) -> GraphicsResult<()> {
        self.compositor.composite(&mut self.backend, &mut self.scene)?;
        self.present(self.compositor.front())
    }

    /// Letterboxes `source` into the window and swaps.
    pub(super) fn present(&mut self, source: SurfaceId) -> GraphicsResult<()> {
        self.compositor.present(&mut self.backend, source, &self.geometry)?;
        self.swap_window()
    }

    fn swap_window(&mut self) -> GraphicsResult<()> {
        self.limiter.delay();
        self.backend.swap_window()?;
        self.frame_count += 1;
        self.window.notify_frame();
        Ok(())
    }
}

/// Brightness at `step` of a linear `duration`-step ramp from `from` to `to`.
fn ramp(from: i32, to: i32, step: i32, duration: i32) -> i32 {
    let (from, to) = (i64::from(from), i64::from(to));
    (from + (to - from) * i64::from(step) / i64::from(duration)) as i32
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::super::testing::{Harness, small_config};
    use super::ramp;
    use crate::config::GraphicsConfig;
    use crate::coords::{Color, IntRect, Size};
    use crate::core::GraphicsError;
    use crate::scene::ColorPlane;
    use crate::time::Timer;
    use crate::window::HeadlessWindow;

    fn window_px(h: &Harness, x: u32, y: u32) -> [u8; 4] {
        h.gfx.backend().window_frame().unwrap().pixel(x, y).unwrap()
    }

    // ── update ────────────────────────────────────────────────────────────

    #[test]
    fn update_presents_one_frame() {
        let mut h = Harness::new();
        h.gfx.scene_mut().insert(Box::new(ColorPlane::full_screen(Color::white(), 0)));

        h.gfx.update().unwrap();

        assert_eq!(h.presented(), 1);
        assert_eq!(h.gfx.frame_count(), 1);
        assert_eq!(h.gfx.window().frames(), 1);
        // 16x12 in 32x24 fills the window exactly.
        assert_eq!(h.gfx.backend().window_frame().unwrap().size(), h.window_size());
        assert_eq!(window_px(&h, 31, 23), [255; 4]);
    }

    #[test]
    fn update_paces_through_the_limiter() {
        let mut h = Harness::new();
        h.gfx.update().unwrap();
        h.gfx.update().unwrap();
        assert_eq!(h.timer.now(), 2000);
    }

    #[test]
    fn update_draws_nothing_while_frozen() {
        let mut h = Harness::new();
        h.gfx.freeze().unwrap();
        h.gfx.update().unwrap();

        assert_eq!(h.presented(), 0);
        assert_eq!(h.gfx.frame_count(), 0);
    }

    #[test]
    fn update_propagates_signals() {
        let mut h = Harness::new();
        h.signals.request_reset();
        assert!(matches!(h.gfx.update(), Err(GraphicsError::Reset)));

        h.signals.request_terminate();
        assert!(matches!(h.gfx.update(), Err(GraphicsError::Shutdown)));
        assert_eq!(h.presented(), 0);
    }

    #[test]
    fn update_skips_presentation_when_far_behind() {
        let mut h = Harness::new();
        h.gfx.update().unwrap();

        // A five-frame stall puts the limiter 4000 ticks behind.
        h.timer.advance(5000);
        h.gfx.update().unwrap();
        assert!(h.gfx.limiter().frame_skip_required());

        h.gfx.update().unwrap();
        assert_eq!(h.presented(), 2);
        assert_eq!(h.gfx.frame_count(), 3);
        assert_eq!(h.gfx.window().frames(), 3);
    }

    #[test]
    fn without_frame_skip_overload_only_resets_drift() {
        let config = GraphicsConfig { frame_skip: false, ..small_config() };
        let mut h = Harness::with(config, HeadlessWindow::new());
        h.gfx.update().unwrap();
        h.timer.advance(5000);
        h.gfx.update().unwrap();

        h.gfx.update().unwrap();
        assert_eq!(h.presented(), 3);
        assert_eq!(h.gfx.limiter().ideal_drift(), 0);
    }

    #[test]
    fn update_applies_pending_window_resize() {
        let mut h = Harness::new();
        h.signals.resize.post(Size::new(64, 24));
        h.gfx.update().unwrap();

        assert_eq!(h.gfx.geometry().window(), Size::new(64, 24));
        assert_eq!(h.gfx.window().screen_changes(), &[IntRect::new(16, 0, 32, 24)]);
        // Pillarbox bars stay black.
        assert_eq!(window_px(&h, 0, 0), [0, 0, 0, 255]);
    }

    // ── sync pause ────────────────────────────────────────────────────────

    /// Locks the pause gate and releases it from another thread after a short
    /// delay. The flag is set just before the unlock.
    fn release_later(h: &Harness) -> (thread::JoinHandle<()>, Arc<AtomicBool>) {
        h.signals.sync.lock();
        let released = Arc::new(AtomicBool::new(false));
        let signals = Arc::clone(&h.signals);
        let flag = Arc::clone(&released);
        let unlocker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            flag.store(true, Ordering::Release);
            signals.sync.unlock();
        });
        (unlocker, released)
    }

    #[test]
    fn update_waits_out_pause_and_drops_drift() {
        let mut h = Harness::new();
        h.gfx.update().unwrap();

        let (unlocker, released) = release_later(&h);
        // Time lost while paused must not be caught up afterwards.
        h.timer.advance(5000);
        h.gfx.update().unwrap();
        unlocker.join().unwrap();

        assert!(released.load(Ordering::Acquire));
        assert!(!h.signals.sync.is_locked());
        assert_eq!(h.presented(), 2);
        assert_eq!(h.gfx.limiter().ideal_drift(), 0);
        assert!(!h.gfx.limiter().frame_skip_required());
    }

    #[test]
    fn transition_waits_out_pause() {
        let mut h = Harness::new();
        h.gfx.freeze().unwrap();

        let (unlocker, released) = release_later(&h);
        h.gfx.transition(3, None, 40).unwrap();
        unlocker.join().unwrap();

        assert!(released.load(Ordering::Acquire));
        assert_eq!(h.gfx.backend().transition_progress().len(), 3);
        assert!(!h.gfx.is_frozen());
    }

    // ── wait / fade ───────────────────────────────────────────────────────

    #[test]
    fn wait_presents_each_frame() {
        let mut h = Harness::new();
        h.gfx.wait(4).unwrap();
        assert_eq!(h.presented(), 4);
        assert_eq!(h.gfx.frame_count(), 4);
    }

    #[test]
    fn fadeout_ramps_to_black() {
        let mut h = Harness::new();
        h.gfx.scene_mut().insert(Box::new(ColorPlane::full_screen(Color::white(), 0)));

        h.gfx.fadeout(3).unwrap();
        assert_eq!(h.gfx.brightness(), 0);
        assert_eq!(h.presented(), 3);
        assert_eq!(window_px(&h, 4, 4), [0, 0, 0, 255]);

        h.gfx.fadein(5).unwrap();
        assert_eq!(h.gfx.brightness(), 255);
        assert_eq!(window_px(&h, 4, 4), [255; 4]);
    }

    #[test]
    fn fade_while_frozen_shows_snapshot() {
        let mut h = Harness::new();
        h.gfx.scene_mut().insert(Box::new(ColorPlane::full_screen(Color::white(), 0)));
        h.gfx.freeze().unwrap();
        h.gfx.scene_mut().insert(Box::new(ColorPlane::full_screen(Color::black(), 1)));

        h.gfx.fadeout(4).unwrap();

        assert_eq!(h.gfx.brightness(), 0);
        assert_eq!(h.presented(), 4);
        assert_eq!(h.gfx.frame_count(), 4);
        assert_eq!(window_px(&h, 0, 0), [255; 4]);
        assert!(h.gfx.is_frozen());
    }

    #[test]
    fn ramp_is_linear_and_exact_at_ends() {
        assert_eq!(ramp(255, 0, 1, 2), 128);
        assert_eq!(ramp(255, 0, 2, 2), 0);
        assert_eq!(ramp(0, 255, 1, 5), 51);
        assert_eq!(ramp(100, 255, 5, 5), 255);
    }

    #[test]
    fn ramp_survives_huge_durations() {
        let d = i32::MAX;
        assert_eq!(ramp(255, 0, d - 1, d), 1);
        assert_eq!(ramp(255, 0, d, d), 0);
        assert_eq!(ramp(0, 255, d / 2, d), 127);
    }

    #[test]
    fn non_positive_fade_is_a_noop() {
        let mut h = Harness::new();
        h.gfx.set_brightness(128);
        h.gfx.fadeout(0).unwrap();
        h.gfx.fadein(-3).unwrap();

        assert_eq!(h.gfx.brightness(), 128);
        assert_eq!(h.presented(), 0);
    }

    // ── repaint_wait ──────────────────────────────────────────────────────

    #[test]
    fn repaint_wait_returns_when_flag_already_set() {
        let mut h = Harness::new();
        let exit = AtomicBool::new(true);
        h.gfx.repaint_wait(&exit, true).unwrap();
        assert_eq!(h.presented(), 0);
    }

    #[test]
    fn repaint_wait_honors_reset_only_when_asked() {
        let mut h = Harness::new();
        let exit = AtomicBool::new(false);

        h.signals.request_reset();
        assert!(matches!(h.gfx.repaint_wait(&exit, true), Err(GraphicsError::Reset)));

        h.signals.request_terminate();
        assert!(matches!(h.gfx.repaint_wait(&exit, false), Err(GraphicsError::Shutdown)));
        assert_eq!(h.presented(), 0);
    }
}
