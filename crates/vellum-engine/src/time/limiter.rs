use std::sync::Arc;

use crate::core::EngineCtx;

use super::Timer;

/// Adaptive frame limiter.
///
/// Each `delay()` sleeps for the remainder of the frame budget minus the signed
/// drift accumulated so far, then re-measures how far the wake-up landed from the
/// ideal timestep. Oversleeping shortens the next delay, undersleeping lengthens
/// it, so the long-run rate converges on the target even with coarse OS timers.
///
/// Owned and mutated only by the render thread.
pub struct FrameLimiter {
    timer: Arc<dyn Timer>,

    ticks_per_frame: i64,
    last_tick: u64,

    /// Tick of the previous wake-up, used to measure real frame length.
    adjust_mark: u64,
    /// Signed distance (ticks) from the ideal timestep. Positive = behind.
    ideal_drift: i64,
    /// Zero the drift at the end of the next `delay()`.
    reset_pending: bool,

    disabled: bool,
}

impl FrameLimiter {
    pub fn new(ctx: &EngineCtx, desired_fps: u32) -> Self {
        let timer = Arc::clone(ctx.timer());
        let now = timer.now();

        let mut limiter = Self {
            timer,
            ticks_per_frame: 0,
            last_tick: now,
            adjust_mark: now,
            ideal_drift: 0,
            reset_pending: false,
            disabled: false,
        };
        limiter.set_desired_fps(desired_fps);
        limiter
    }

    pub fn set_desired_fps(&mut self, fps: u32) {
        let freq = self.timer.frequency() as i64;
        self.ticks_per_frame = (freq / i64::from(fps.max(1))).max(1);
    }

    #[inline]
    pub fn ticks_per_frame(&self) -> i64 {
        self.ticks_per_frame
    }

    #[inline]
    pub fn ideal_drift(&self) -> i64 {
        self.ideal_drift
    }

    /// Disabled when pacing is external (display sync) or uncapped.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Sleeps until the next frame boundary and updates the drift estimate.
    pub fn delay(&mut self) {
        if self.disabled {
            return;
        }

        let elapsed = self.timer.now().saturating_sub(self.last_tick) as i64;
        let to_delay = (self.ticks_per_frame - elapsed - self.ideal_drift).max(0);
        self.timer.sleep(to_delay as u64);

        let now = self.timer.now();
        self.last_tick = now;

        let diff = now.saturating_sub(self.adjust_mark) as i64;
        self.adjust_mark = now;
        self.ideal_drift = diff - self.ticks_per_frame + self.ideal_drift;

        if self.reset_pending {
            self.ideal_drift = 0;
            self.reset_pending = false;
        }
    }

    /// Discards accumulated drift once the next `delay()` has measured its frame.
    ///
    /// Used after pauses so the limiter does not try to catch up on lost time.
    pub fn reset_frame_adjust(&mut self) {
        self.reset_pending = true;
    }

    /// True when more than a full frame behind the ideal timestep.
    pub fn frame_skip_required(&self) -> bool {
        if self.disabled {
            return false;
        }
        self.ideal_drift > self.ticks_per_frame
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;
    use crate::config::GraphicsConfig;
    use crate::sync::ThreadSignals;
    use crate::time::ManualTimer;

    const FREQ: u64 = 60_000;

    fn limiter_with(timer: Arc<dyn Timer>, fps: u32) -> FrameLimiter {
        let ctx = EngineCtx::new(
            Arc::new(GraphicsConfig::default()),
            Arc::new(ThreadSignals::new()),
            timer,
        );
        FrameLimiter::new(&ctx, fps)
    }

    fn manual() -> (Arc<ManualTimer>, FrameLimiter) {
        let timer = Arc::new(ManualTimer::new(FREQ));
        let limiter = limiter_with(timer.clone(), 60);
        (timer, limiter)
    }

    /// Oversleeps by a fixed amount on every call.
    struct LateTimer {
        now: AtomicU64,
        late_by: u64,
    }

    impl Timer for LateTimer {
        fn frequency(&self) -> u64 {
            FREQ
        }
        fn now(&self) -> u64 {
            self.now.load(Ordering::Acquire)
        }
        fn sleep(&self, ticks: u64) {
            self.now.fetch_add(ticks + self.late_by, Ordering::AcqRel);
        }
    }

    #[test]
    fn ticks_per_frame_follows_frequency() {
        let (_, mut l) = manual();
        assert_eq!(l.ticks_per_frame(), 1000);
        l.set_desired_fps(40);
        assert_eq!(l.ticks_per_frame(), 1500);
    }

    #[test]
    fn on_time_wakeups_keep_drift_bounded() {
        let (timer, mut l) = manual();
        for frame in 0..500 {
            timer.advance(100 + (frame % 7) * 50); // frame work, always under budget
            l.delay();
            assert!(l.ideal_drift().abs() <= 1, "drift {} at frame {frame}", l.ideal_drift());
        }
    }

    #[test]
    fn each_frame_lasts_one_budget() {
        let (timer, mut l) = manual();
        let start = timer.now();
        for _ in 0..60 {
            timer.advance(250);
            l.delay();
        }
        assert_eq!(timer.now() - start, 60 * 1000);
    }

    #[test]
    fn late_wakeups_are_compensated_over_the_long_run() {
        let timer = Arc::new(LateTimer { now: AtomicU64::new(0), late_by: 300 });
        let mut l = limiter_with(timer.clone(), 60);

        for _ in 0..600 {
            l.delay();
        }

        // Without correction 600 frames would take 600 * 1300 ticks.
        let total = timer.now() as i64;
        assert!((total - 600 * 1000).abs() <= 1000, "total {total}");
    }

    #[test]
    fn stall_requires_frame_skip() {
        let (timer, mut l) = manual();
        l.delay();
        assert!(!l.frame_skip_required());

        timer.advance(5000);
        l.delay();
        assert_eq!(l.ideal_drift(), 4000);
        assert!(l.frame_skip_required());
    }

    #[test]
    fn skip_is_required_only_beyond_a_full_frame() {
        let (timer, mut l) = manual();
        l.delay();
        timer.advance(2000);
        l.delay();
        // Exactly one frame behind: not yet.
        assert_eq!(l.ideal_drift(), 1000);
        assert!(!l.frame_skip_required());
    }

    #[test]
    fn reset_frame_adjust_zeroes_drift_on_next_delay() {
        let (timer, mut l) = manual();
        timer.advance(5000);
        l.delay();
        assert!(l.ideal_drift() > 0);

        l.reset_frame_adjust();
        timer.advance(9000);
        l.delay();
        assert_eq!(l.ideal_drift(), 0);
        assert!(!l.frame_skip_required());
    }

    #[test]
    fn disabled_limiter_is_a_no_op() {
        let (timer, mut l) = manual();
        l.set_disabled(true);

        timer.advance(10_000);
        let before = timer.now();
        l.delay();
        assert_eq!(timer.now(), before);
        assert_eq!(l.ideal_drift(), 0);
        assert!(!l.frame_skip_required());
    }

    #[test]
    fn disabled_limiter_never_requests_skip_even_with_drift() {
        let (timer, mut l) = manual();
        timer.advance(5000);
        l.delay();
        assert!(l.frame_skip_required());

        l.set_disabled(true);
        assert!(!l.frame_skip_required());
    }
}
