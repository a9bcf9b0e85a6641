/// An acquired window frame.
///
/// Holding the surface texture prevents acquisition of subsequent frames, so the
/// backend presents or drops it on the next `swap_window`.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}
