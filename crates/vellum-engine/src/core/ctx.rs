use std::fmt;
use std::sync::Arc;

use crate::config::GraphicsConfig;
use crate::sync::ThreadSignals;
use crate::time::{SystemTimer, Timer};

/// Shared engine context handed to the compositor, the limiter and the facade at
/// construction.
///
/// Cloning is cheap; every field is reference counted and immutable after boot
/// (the signals are interior-mutable atomics).
#[derive(Clone)]
pub struct EngineCtx {
    config: Arc<GraphicsConfig>,
    signals: Arc<ThreadSignals>,
    timer: Arc<dyn Timer>,
}

impl EngineCtx {
    pub fn new(
        config: Arc<GraphicsConfig>,
        signals: Arc<ThreadSignals>,
        timer: Arc<dyn Timer>,
    ) -> Self {
        Self { config, signals, timer }
    }

    /// Context backed by the wall clock.
    pub fn with_system_timer(config: GraphicsConfig, signals: Arc<ThreadSignals>) -> Self {
        Self::new(Arc::new(config), signals, Arc::new(SystemTimer::new()))
    }

    #[inline]
    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    #[inline]
    pub fn signals(&self) -> &Arc<ThreadSignals> {
        &self.signals
    }

    #[inline]
    pub fn timer(&self) -> &Arc<dyn Timer> {
        &self.timer
    }
}

impl fmt::Debug for EngineCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineCtx")
            .field("config", &self.config)
            .field("signals", &self.signals)
            .field("timer_frequency", &self.timer.frequency())
            .finish()
    }
}
