use std::collections::HashMap;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

use crate::render::{BlendMode, EffectPass};

/// Fragment entry points of `shaders/compositor.wgsl`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(super) enum Program {
    Flat,
    Blit,
    Gray,
    Sepia,
    Tint,
    SimpleTransition,
    MapTransition,
}

impl Program {
    fn entry_point(self) -> &'static str {
        match self {
            Program::Flat => "fs_flat",
            Program::Blit => "fs_blit",
            Program::Gray => "fs_gray",
            Program::Sepia => "fs_sepia",
            Program::Tint => "fs_tint",
            Program::SimpleTransition => "fs_trans_simple",
            Program::MapTransition => "fs_trans_map",
        }
    }

    pub(super) fn for_pass(pass: &EffectPass) -> Self {
        match pass {
            EffectPass::Gray { .. } => Program::Gray,
            EffectPass::Sepia { .. } => Program::Sepia,
            EffectPass::Tint { .. } => Program::Tint,
            EffectPass::SimpleTransition { .. } => Program::SimpleTransition,
            EffectPass::MapTransition { .. } => Program::MapTransition,
        }
    }
}

// ── uniform ───────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct DrawUniform {
    pub dst_rect: [f32; 4],
    pub src_rect: [f32; 4],
    pub target_size: [f32; 4],
    pub color: [f32; 4],
    /// x = progress, y = vague, z = strength / opacity
    pub params: [f32; 4],
}

impl DrawUniform {
    const FULL_UV: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

    /// Full-target quad with default parameters.
    pub(super) fn full(target_w: u32, target_h: u32) -> Self {
        Self {
            dst_rect: [0.0, 0.0, target_w as f32, target_h as f32],
            src_rect: Self::FULL_UV,
            target_size: [target_w as f32, target_h as f32, 0.0, 0.0],
            color: [0.0; 4],
            params: [0.0, 0.0, 1.0, 0.0],
        }
    }
}

fn uniform_min_binding_size() -> Option<NonZeroU64> {
    NonZeroU64::new(std::mem::size_of::<DrawUniform>() as u64)
}

// ── blend ─────────────────────────────────────────────────────────────────

/// Target alpha is kept by `Add` and `ReverseSubtract`.
fn blend_state(mode: BlendMode) -> Option<wgpu::BlendState> {
    let keep_alpha = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    };
    let additive = |operation| wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation,
    };

    match mode {
        BlendMode::Normal => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        }),
        BlendMode::Add => Some(wgpu::BlendState {
            color: additive(wgpu::BlendOperation::Add),
            alpha: keep_alpha,
        }),
        BlendMode::ReverseSubtract => Some(wgpu::BlendState {
            color: additive(wgpu::BlendOperation::ReverseSubtract),
            alpha: keep_alpha,
        }),
        BlendMode::Replace => None,
    }
}

// ── pipelines ─────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: Program,
    blend: BlendMode,
    format: wgpu::TextureFormat,
}

/// Shader module, shared layout and a lazily filled pipeline cache.
pub(super) struct Programs {
    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    pub nearest: wgpu::Sampler,
    pub linear: wgpu::Sampler,
}

impl Programs {
    pub(super) fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("vellum compositor shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/compositor.wgsl").into()),
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("vellum compositor bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: uniform_min_binding_size(),
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("vellum compositor pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let sampler = |label, filter| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter,
                min_filter: filter,
                ..Default::default()
            })
        };

        Self {
            nearest: sampler("vellum nearest sampler", wgpu::FilterMode::Nearest),
            linear: sampler("vellum linear sampler", wgpu::FilterMode::Linear),
            shader,
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
        }
    }

    #[inline]
    pub(super) fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub(super) fn pipeline(
        &mut self,
        device: &wgpu::Device,
        program: Program,
        blend: BlendMode,
        format: wgpu::TextureFormat,
    ) -> &wgpu::RenderPipeline {
        let key = PipelineKey { program, blend, format };
        let (shader, layout) = (&self.shader, &self.pipeline_layout);

        self.pipelines.entry(key).or_insert_with(|| {
            log::debug!("creating pipeline {program:?}/{blend:?}/{format:?}");
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("vellum compositor pipeline"),
                layout: Some(layout),

                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },

                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some(program.entry_point()),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: blend_state(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        })
    }
}
