/// One acquired surface image plus the encoder recording into it.
///
/// Holding a `GpuFrame` blocks acquisition of the next one; submit and present
/// it within the same redraw.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
