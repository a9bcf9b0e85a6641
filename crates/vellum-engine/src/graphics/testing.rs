use std::sync::Arc;

use crate::config::GraphicsConfig;
use crate::coords::Size;
use crate::core::EngineCtx;
use crate::render::SoftwareBackend;
use crate::sync::ThreadSignals;
use crate::time::ManualTimer;
use crate::window::HeadlessWindow;

use super::Graphics;

pub(super) fn small_config() -> GraphicsConfig {
    GraphicsConfig {
        start_width: 16,
        start_height: 12,
        window_width: 32,
        window_height: 24,
        ..GraphicsConfig::default()
    }
}

/// Facade on the CPU backend with a hand-driven clock.
pub(super) struct Harness {
    pub gfx: Graphics<SoftwareBackend, HeadlessWindow>,
    pub timer: Arc<ManualTimer>,
    pub signals: Arc<ThreadSignals>,
}

impl Harness {
    /// 60 fps is exactly 1000 ticks per frame.
    pub const FREQ: u64 = 60_000;

    pub fn new() -> Self {
        Self::with(small_config(), HeadlessWindow::new())
    }

    pub fn with(config: GraphicsConfig, window: HeadlessWindow) -> Self {
        let window_size = config.window_size();
        let timer = Arc::new(ManualTimer::new(Self::FREQ));
        let signals = Arc::new(ThreadSignals::new());
        let ctx = EngineCtx::new(Arc::new(config), Arc::clone(&signals), timer.clone());

        let gfx = Graphics::new(ctx, SoftwareBackend::new(), window, window_size)
            .expect("headless graphics");
        Self { gfx, timer, signals }
    }

    pub fn presented(&self) -> usize {
        self.gfx.backend().presented_frames()
    }

    pub fn window_size(&self) -> Size {
        self.gfx.geometry().window()
    }
}
