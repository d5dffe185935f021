use std::num::NonZeroU64;

use crate::backend::{ProgramDesc, VertexInput};
use crate::batch::ElementType;
use crate::error::{CompileError, ShaderStage};

use super::scope;
use super::target::DEPTH_FORMAT;

const TRANSFORM_SIZE: u64 = std::mem::size_of::<[[f32; 4]; 4]>() as u64;

/// A linked render pipeline plus the group-0 bindings it expects.
pub struct WgpuProgram {
    pub(super) label: String,
    pub(super) pipeline: wgpu::RenderPipeline,
    pub(super) inputs: Vec<VertexInput>,
    pub(super) group: ProgramGroup,
}

pub(super) enum ProgramGroup {
    None,
    /// Uniform buffer with the view-projection matrix, bound once.
    Transform { buffer: wgpu::Buffer, bind_group: wgpu::BindGroup },
    /// Texture + sampler, bound per draw from the sampled target.
    Texture { layout: wgpu::BindGroupLayout },
}

fn vertex_format(input: &VertexInput) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;
    Some(match (input.element, input.components, input.normalized) {
        (ElementType::F32, 1, _) => F::Float32,
        (ElementType::F32, 2, _) => F::Float32x2,
        (ElementType::F32, 3, _) => F::Float32x3,
        (ElementType::F32, 4, _) => F::Float32x4,
        (ElementType::U32, 1, false) => F::Uint32,
        (ElementType::U32, 2, false) => F::Uint32x2,
        (ElementType::U32, 3, false) => F::Uint32x3,
        (ElementType::U32, 4, false) => F::Uint32x4,
        (ElementType::U16, 2, false) => F::Uint16x2,
        (ElementType::U16, 4, false) => F::Uint16x4,
        (ElementType::U16, 2, true) => F::Unorm16x2,
        (ElementType::U16, 4, true) => F::Unorm16x4,
        (ElementType::U8, 4, false) => F::Uint8x4,
        (ElementType::U8, 4, true) => F::Unorm8x4,
        _ => return None,
    })
}

fn compile_module(
    device: &wgpu::Device,
    label: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<wgpu::ShaderModule, CompileError> {
    let (module, faults) = scope::capture(device, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} {stage}")),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        })
    });
    if faults.is_empty() {
        Ok(module)
    } else {
        Err(CompileError {
            program: label.to_owned(),
            stage,
            log: faults.join("\n"),
        })
    }
}

pub(super) fn compile(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    desc: &ProgramDesc<'_>,
) -> Result<WgpuProgram, CompileError> {
    let link_error = |log: String| CompileError {
        program: desc.label.to_owned(),
        stage: ShaderStage::Link,
        log,
    };

    let vs = compile_module(device, desc.label, ShaderStage::Vertex, desc.source.vertex)?;
    let fs = compile_module(device, desc.label, ShaderStage::Fragment, desc.source.fragment)?;

    // One buffer slot per stream; streams are packed back to back, not interleaved.
    let mut attributes = Vec::with_capacity(desc.inputs.len());
    for input in &desc.inputs {
        let format = vertex_format(input).ok_or_else(|| {
            link_error(format!(
                "stream `{}` has no vertex format for {}x{:?} (normalized: {})",
                input.stream, input.components, input.element, input.normalized
            ))
        })?;
        attributes.push([wgpu::VertexAttribute {
            format,
            offset: 0,
            shader_location: input.location,
        }]);
    }
    let buffers: Vec<wgpu::VertexBufferLayout<'_>> = attributes
        .iter()
        .map(|attr| wgpu::VertexBufferLayout {
            array_stride: attr[0].format.size(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: attr,
        })
        .collect();

    let group_layout = if desc.uses_transform {
        Some(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessera transform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(TRANSFORM_SIZE),
                },
                count: None,
            }],
        }))
    } else if desc.samples_texture {
        Some(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessera texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        }))
    } else {
        None
    };

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("tessera pipeline layout"),
        bind_group_layouts: &group_layout.iter().collect::<Vec<_>>(),
        immediate_size: 0,
    });

    let depth_stencil = desc.depth.then(|| wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: desc.state.depth_test.is_some(),
        depth_compare: desc
            .state
            .depth_test
            .map_or(wgpu::CompareFunction::Always, |c| c.to_wgpu()),
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    });

    let (pipeline, faults) = scope::capture(device, || {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vs,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fs,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil,
            multisample: wgpu::MultisampleState {
                count: desc.state.sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview_mask: None,
            cache: None,
        })
    });
    if !faults.is_empty() {
        return Err(link_error(faults.join("\n")));
    }

    let group = match group_layout {
        Some(layout) if desc.uses_transform => {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tessera transform ubo"),
                size: TRANSFORM_SIZE,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tessera transform bind group"),
                layout: &layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            ProgramGroup::Transform { buffer, bind_group }
        }
        Some(layout) => ProgramGroup::Texture { layout },
        None => ProgramGroup::None,
    };

    log::debug!(
        "compiled program `{}` ({} inputs, {} samples)",
        desc.label,
        desc.inputs.len(),
        desc.state.sample_count
    );

    Ok(WgpuProgram {
        label: desc.label.to_owned(),
        pipeline,
        inputs: desc.inputs.clone(),
        group,
    })
}
