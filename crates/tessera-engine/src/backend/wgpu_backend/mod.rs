//! [`GraphicsBackend`] on wgpu.
//!
//! Bind/clear/draw calls are folded into render passes: `bind_target` records
//! which attachments the next passes use, `clear` becomes the load op of the
//! following pass, and every draw or resolve opens its own pass on the frame
//! encoder. A clear with no draw after it is flushed as an empty pass.

mod program;
mod scope;
mod target;

use crate::backend::{DrawCall, FrameStatus, GraphicsBackend, ProgramDesc, ShaderSet, ShaderSource};
use crate::batch::{PackedLayout, PackedMesh};
use crate::coords::PhysicalExtent;
use crate::device::{Gpu, GpuFrame};
use crate::error::{CompileError, FramebufferError};
use crate::target::{ClearOp, PassState, TargetCaps, TargetDesc};

pub use program::WgpuProgram;
pub use target::WgpuTarget;

use program::ProgramGroup;
use scope::ErrorScope;

/// WGSL programs matching the quad batch layout.
pub fn builtin_shaders() -> ShaderSet<'static> {
    ShaderSet {
        scene: ShaderSource {
            vertex: include_str!("shaders/scene_vs.wgsl"),
            fragment: include_str!("shaders/scene_fs.wgsl"),
        },
        screen: ShaderSource {
            vertex: include_str!("shaders/screen_vs.wgsl"),
            fragment: include_str!("shaders/screen_fs.wgsl"),
        },
    }
}

pub struct WgpuMesh {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    layout: PackedLayout,
}

/// Acquired swapchain image the screen target draws into.
struct SurfaceImage {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// Attachments the next pass renders into.
struct BoundPass {
    color: wgpu::TextureView,
    depth: Option<wgpu::TextureView>,
    clear: Option<ClearOp>,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,
    caps: TargetCaps,
    sampler: wgpu::Sampler,

    encoder: Option<wgpu::CommandEncoder>,
    surface: Option<SurfaceImage>,
    scope: Option<ErrorScope>,
    bound: Option<BoundPass>,
    faults: Vec<String>,
}

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

impl WgpuBackend {
    /// Offscreen targets share the surface format so the screen pass can
    /// sample them and resolves stay format-compatible.
    pub fn new(gpu: &Gpu<'_>) -> Self {
        let device = gpu.device().clone();
        let color_format = gpu.surface_format();
        let caps = target::query_caps(gpu.adapter(), &device, color_format);
        log::info!(
            "render targets: {color_format:?}, max {}px, samples {:?}",
            caps.max_dimension,
            caps.sample_counts
        );
        Self::with_device(device, gpu.queue().clone(), color_format, caps)
    }

    /// Backend on an existing device with no window; only offscreen targets
    /// can be bound until a frame is attached.
    pub fn with_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
        caps: TargetCaps,
    ) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tessera screen sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            device,
            queue,
            color_format,
            caps,
            sampler,
            encoder: None,
            surface: None,
            scope: None,
            bound: None,
            faults: Vec::new(),
        }
    }

    /// Hands over the surface frame the next `begin_frame`..`end_frame` records into.
    pub fn attach_frame(&mut self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;
        if self.encoder.replace(encoder).is_some() {
            log::warn!("previous frame was never ended; dropped");
        }
        self.surface = Some(SurfaceImage {
            texture: surface_texture,
            view,
        });
    }

    fn begin_pass<'e>(
        encoder: &'e mut wgpu::CommandEncoder,
        label: &str,
        color: &wgpu::TextureView,
        resolve: Option<&wgpu::TextureView>,
        depth: Option<&wgpu::TextureView>,
        clear: Option<ClearOp>,
    ) -> wgpu::RenderPass<'e> {
        let color_load = match clear {
            Some(op) => wgpu::LoadOp::Clear(op.color.to_wgpu()),
            None => wgpu::LoadOp::Load,
        };
        let depth_load = match clear.and_then(|op| op.depth) {
            Some(d) => wgpu::LoadOp::Clear(d),
            None => wgpu::LoadOp::Load,
        };
        let stencil_load = match clear {
            Some(_) => wgpu::LoadOp::Clear(0),
            None => wgpu::LoadOp::Load,
        };

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                resolve_target: resolve,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: depth.map(|view| wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: stencil_load,
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }

    /// Emits a pending clear that no draw consumed.
    fn flush_clear(&mut self) {
        let (Some(encoder), Some(bound)) = (self.encoder.as_mut(), self.bound.as_mut()) else {
            return;
        };
        if let Some(op) = bound.clear.take() {
            let _pass = Self::begin_pass(
                encoder,
                "tessera clear",
                &bound.color,
                None,
                bound.depth.as_ref(),
                Some(op),
            );
        }
    }
}

impl GraphicsBackend for WgpuBackend {
    type Target = WgpuTarget;
    type Mesh = WgpuMesh;
    type Program = WgpuProgram;

    fn target_caps(&self) -> TargetCaps {
        self.caps.clone()
    }

    fn compile_program(&mut self, desc: &ProgramDesc<'_>) -> Result<WgpuProgram, CompileError> {
        program::compile(&self.device, self.color_format, desc)
    }

    fn create_target(&mut self, desc: &TargetDesc) -> Result<WgpuTarget, FramebufferError> {
        desc.check_complete(&self.caps)?;
        let target = target::create(&self.device, self.color_format, desc)?;
        log::debug!(
            "created target `{}` {}x{} ({} samples, depth: {})",
            desc.label,
            desc.extent.width,
            desc.extent.height,
            desc.sample_count,
            desc.depth
        );
        Ok(target)
    }

    fn upload_mesh(&mut self, mesh: &PackedMesh) -> WgpuMesh {
        let vertex = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessera vertex buffer"),
            size: align4(mesh.vertex_bytes.len()).max(4) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let index = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessera index buffer"),
            size: align4(mesh.index_bytes.len()).max(4) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        for (buffer, bytes) in [(&vertex, &mesh.vertex_bytes), (&index, &mesh.index_bytes)] {
            if bytes.is_empty() {
                continue;
            }
            if bytes.len() % 4 == 0 {
                self.queue.write_buffer(buffer, 0, bytes);
            } else {
                let mut padded = bytes.clone();
                padded.resize(align4(bytes.len()), 0);
                self.queue.write_buffer(buffer, 0, &padded);
            }
        }

        log::debug!(
            "uploaded mesh: {} vertex bytes, {} indices ({:?})",
            mesh.vertex_bytes.len(),
            mesh.index_count,
            mesh.index_format
        );
        WgpuMesh {
            vertex,
            index,
            layout: mesh.layout.clone(),
        }
    }

    fn write_vertex_bytes(&mut self, mesh: &WgpuMesh, offset: usize, bytes: &[u8]) {
        if offset % 4 != 0 || bytes.len() % 4 != 0 {
            self.faults.push(format!(
                "unaligned vertex write ({} bytes at {offset})",
                bytes.len()
            ));
            return;
        }
        if offset + bytes.len() > mesh.layout.total_bytes() {
            self.faults.push(format!(
                "vertex write past end of buffer ({} bytes at {offset}, buffer {})",
                bytes.len(),
                mesh.layout.total_bytes()
            ));
            return;
        }
        self.queue.write_buffer(&mesh.vertex, offset as u64, bytes);
    }

    fn set_transform(&mut self, program: &WgpuProgram, view_projection: [[f32; 4]; 4]) {
        match &program.group {
            ProgramGroup::Transform { buffer, .. } => {
                self.queue
                    .write_buffer(buffer, 0, bytemuck::bytes_of(&view_projection));
            }
            _ => log::warn!("program `{}` has no transform uniform", program.label),
        }
    }

    fn begin_frame(&mut self) -> FrameStatus {
        if self.encoder.is_none() {
            return FrameStatus::Skip;
        }
        self.scope = Some(ErrorScope::open(&self.device));
        FrameStatus::Ready
    }

    fn bind_target(&mut self, target: &WgpuTarget, state: &PassState) {
        self.flush_clear();

        if *state != target.desc.pass_state() {
            self.faults.push(format!(
                "`{}` bound with {state:?}, expected {:?}",
                target.desc.label,
                target.desc.pass_state()
            ));
        }

        let color = match (&target.color, &self.surface) {
            (Some(attachment), _) => attachment.view.clone(),
            (None, Some(surface)) => surface.view.clone(),
            (None, None) => {
                self.faults
                    .push(format!("`{}` bound outside a frame", target.desc.label));
                self.bound = None;
                return;
            }
        };

        log::trace!("bind `{}`", target.desc.label);
        self.bound = Some(BoundPass {
            color,
            depth: target.depth.as_ref().map(|d| d.view.clone()),
            clear: None,
        });
    }

    fn clear(&mut self, op: &ClearOp) {
        match self.bound.as_mut() {
            Some(bound) => bound.clear = Some(*op),
            None => self.faults.push("clear with no bound target".to_owned()),
        }
    }

    fn draw(
        &mut self,
        program: &WgpuProgram,
        mesh: &WgpuMesh,
        call: &DrawCall,
        texture: Option<&WgpuTarget>,
    ) {
        let mut spans = Vec::with_capacity(program.inputs.len());
        for input in &program.inputs {
            match mesh.layout.get(input.stream) {
                Some(span) => spans.push(span.offset as u64..span.end() as u64),
                None => {
                    self.faults.push(format!(
                        "program `{}` reads stream `{}` missing from the mesh",
                        program.label, input.stream
                    ));
                    return;
                }
            }
        }

        let texture_group = match (&program.group, texture) {
            (ProgramGroup::Texture { layout }, Some(target)) => {
                let Some(color) = target.color.as_ref().filter(|_| target.desc.is_sampleable()) else {
                    self.faults.push(format!(
                        "`{}` cannot be sampled; resolve it first",
                        target.desc.label
                    ));
                    return;
                };
                Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("tessera texture bind group"),
                    layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&color.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        },
                    ],
                }))
            }
            (ProgramGroup::Texture { .. }, None) => {
                self.faults
                    .push(format!("program `{}` needs a texture", program.label));
                return;
            }
            _ => None,
        };

        let (Some(encoder), Some(bound)) = (self.encoder.as_mut(), self.bound.as_mut()) else {
            self.faults.push("draw with no bound target".to_owned());
            return;
        };

        let mut pass = Self::begin_pass(
            encoder,
            &program.label,
            &bound.color,
            None,
            bound.depth.as_ref(),
            bound.clear.take(),
        );
        // An empty mesh still opens the pass so a pending clear lands.
        if call.index_count == 0 || spans.iter().any(|range| range.is_empty()) {
            log::trace!("`{}`: nothing to draw", program.label);
            return;
        }

        pass.set_pipeline(&program.pipeline);
        match (&program.group, &texture_group) {
            (ProgramGroup::Transform { bind_group, .. }, _) => pass.set_bind_group(0, bind_group, &[]),
            (_, Some(bind_group)) => pass.set_bind_group(0, bind_group, &[]),
            _ => {}
        }
        for (slot, range) in spans.into_iter().enumerate() {
            pass.set_vertex_buffer(slot as u32, mesh.vertex.slice(range));
        }
        pass.set_index_buffer(
            mesh.index.slice(call.index_byte_offset..),
            call.index_format.to_wgpu(),
        );
        pass.draw_indexed(0..call.index_count, 0, 0..1);
    }

    fn resolve(&mut self, source: &WgpuTarget, destination: &WgpuTarget, region: PhysicalExtent) {
        self.flush_clear();
        self.bound = None;

        if region != source.desc.extent || region != destination.desc.extent {
            self.faults.push(format!(
                "partial resolve of {region:?} is not supported; `{}` is {:?}",
                source.desc.label, source.desc.extent
            ));
            return;
        }

        let Some(encoder) = self.encoder.as_mut() else {
            self.faults.push("resolve outside a frame".to_owned());
            return;
        };
        let Some(src) = source.color.as_ref() else {
            self.faults
                .push(format!("resolve source `{}` has no color", source.desc.label));
            return;
        };
        let dst = match (destination.color.as_ref(), self.surface.as_ref()) {
            (Some(attachment), _) => &attachment.view,
            (None, Some(surface)) => &surface.view,
            (None, None) => {
                self.faults
                    .push(format!("resolve into `{}` with no surface image", destination.desc.label));
                return;
            }
        };

        log::trace!("resolve `{}` -> `{}`", source.desc.label, destination.desc.label);
        let _pass = Self::begin_pass(
            encoder,
            "tessera resolve",
            &src.view,
            Some(dst),
            None,
            None,
        );
    }

    fn end_frame(&mut self) -> Vec<String> {
        self.flush_clear();
        self.bound = None;

        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
        if let Some(surface) = self.surface.take() {
            surface.texture.present();
        }

        let mut faults = std::mem::take(&mut self.faults);
        if let Some(scope) = self.scope.take() {
            faults.extend(scope.close());
        }
        faults
    }

    fn release_target(&mut self, target: WgpuTarget) {
        log::debug!("released target `{}`", target.desc.label);
        target.destroy();
    }

    fn release_mesh(&mut self, mesh: WgpuMesh) {
        mesh.vertex.destroy();
        mesh.index.destroy();
    }

    fn release_program(&mut self, program: WgpuProgram) {
        log::debug!("released program `{}`", program.label);
    }
}
