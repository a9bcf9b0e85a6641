use std::time::{Duration, Instant};

/// Samples frames-per-second from a monotonically increasing frame counter.
///
/// The event thread owns one of these; the render thread only bumps the counter.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    last: Instant,
    last_count: u64,
    interval: Duration,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self { last: now, last_count: 0, interval: Duration::from_secs(1) }
    }

    /// Returns a new sample once per interval, `None` otherwise.
    pub fn sample(&mut self, frame_count: u64, now: Instant) -> Option<f32> {
        let elapsed = now.saturating_duration_since(self.last);
        if elapsed < self.interval {
            return None;
        }

        let frames = frame_count.saturating_sub(self.last_count);
        self.last = now;
        self.last_count = frame_count;

        Some(frames as f32 / elapsed.as_secs_f32())
    }

    /// Next instant at which `sample` can produce a value.
    pub fn deadline(&self) -> Instant {
        self.last + self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_sample_before_interval() {
        let t0 = Instant::now();
        let mut c = FpsCounter::new(t0);
        assert_eq!(c.sample(10, t0 + Duration::from_millis(500)), None);
    }

    #[test]
    fn sample_counts_frames_since_last() {
        let t0 = Instant::now();
        let mut c = FpsCounter::new(t0);
        let fps = c.sample(60, t0 + Duration::from_secs(1)).unwrap();
        assert!((fps - 60.0).abs() < 0.01);

        let fps = c.sample(90, t0 + Duration::from_secs(2)).unwrap();
        assert!((fps - 30.0).abs() < 0.01);
    }
}
