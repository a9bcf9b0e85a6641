use crate::config::GraphicsConfig;

/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    ///
    /// Off by default: off-screen surfaces hold already-encoded 8-bit colors and
    /// are copied to the window unchanged.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface (hint).
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}

impl GpuInit {
    /// Vsync only when pacing follows the display; the frame limiter paces otherwise.
    pub fn from_config(config: &GraphicsConfig) -> Self {
        let present_mode = if config.sync_to_refresh_rate {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        Self { present_mode, ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsync_follows_refresh_sync() {
        let mut config = GraphicsConfig::default();
        assert_eq!(GpuInit::from_config(&config).present_mode, wgpu::PresentMode::AutoNoVsync);

        config.sync_to_refresh_rate = true;
        assert_eq!(GpuInit::from_config(&config).present_mode, wgpu::PresentMode::Fifo);
    }
}
