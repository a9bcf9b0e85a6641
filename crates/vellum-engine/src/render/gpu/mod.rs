//! wgpu backend.
//!
//! Every draw is one render pass recorded into a single pending encoder, which is
//! submitted on `swap_window` and before readbacks. Off-screen surfaces are
//! `Rgba8Unorm` textures usable as attachment, sampler source and copy endpoint.

mod programs;
mod readback;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::bitmap::Bitmap;
use crate::config::GraphicsConfig;
use crate::coords::{Color, IntRect, Size, Vec2i};
use crate::device::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};

use self::programs::{DrawUniform, Program, Programs};
use super::{BlendMode, EffectPass, GraphicsBackend, SurfaceId};

const SURFACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct GpuSurface {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: Size,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Dest {
    Surface(SurfaceId),
    Window,
}

/// One quad through one program.
struct DrawCall {
    program: Program,
    blend: BlendMode,
    uniform: DrawUniform,
    sources: [Option<SurfaceId>; 3],
    smooth: bool,
    scissor: Option<IntRect>,
    clear: Option<Color>,
}

pub struct WgpuBackend {
    gpu: Gpu,
    programs: Programs,

    surfaces: HashMap<u32, GpuSurface>,
    next_id: u32,

    /// Bound to texture slots a program does not use.
    dummy_view: wgpu::TextureView,

    scissor: Option<IntRect>,
    encoder: Option<wgpu::CommandEncoder>,
    frame: Option<GpuFrame>,
}

impl WgpuBackend {
    pub fn new(window: Arc<Window>, config: &GraphicsConfig) -> Result<Self> {
        let gpu = pollster::block_on(Gpu::new(window, GpuInit::from_config(config)))?;
        let programs = Programs::new(gpu.device());

        let dummy = gpu.device().create_texture(&texture_descriptor(Size::new(1, 1)));
        let dummy_view = dummy.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            gpu,
            programs,
            surfaces: HashMap::new(),
            next_id: 0,
            dummy_view,
            scissor: None,
            encoder: None,
            frame: None,
        })
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    fn surface(&self, id: SurfaceId) -> Result<&GpuSurface> {
        self.surfaces
            .get(&id.0)
            .with_context(|| format!("unknown surface {id:?}"))
    }

    fn alloc(&mut self, size: Size) -> Result<SurfaceId> {
        if size.is_empty() {
            bail!("cannot create an empty {}x{} surface", size.width, size.height);
        }
        let texture = self.gpu.device().create_texture(&texture_descriptor(size));
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        self.surfaces.insert(id.0, GpuSurface { texture, view, size });
        Ok(id)
    }

    /// Submits recorded commands, if any.
    fn flush(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.gpu.queue().submit(std::iter::once(encoder.finish()));
        }
    }

    fn record(&mut self, dest: Dest, call: DrawCall) -> Result<()> {
        if let Dest::Surface(target) = dest {
            if call.sources.contains(&Some(target)) {
                bail!("surface {target:?} cannot be sampled while drawn into");
            }
        }

        let (view, format, size) = match dest {
            Dest::Surface(id) => {
                let s = self
                    .surfaces
                    .get(&id.0)
                    .with_context(|| format!("unknown surface {id:?}"))?;
                (&s.view, SURFACE_FORMAT, s.size)
            }
            Dest::Window => {
                let frame = self.frame.as_ref().context("no window frame acquired")?;
                let PhysicalSize { width, height } = self.gpu.size();
                (&frame.view, self.gpu.view_format(), Size::new(width, height))
            }
        };

        let full = IntRect::from_size(size);
        let scissor = match call.scissor {
            Some(rect) => rect.intersect(full),
            None => Some(full),
        };

        let mut views = [&self.dummy_view; 3];
        for (slot, source) in views.iter_mut().zip(call.sources) {
            if let Some(id) = source {
                let s = self
                    .surfaces
                    .get(&id.0)
                    .with_context(|| format!("unknown source surface {id:?}"))?;
                *slot = &s.view;
            }
        }

        let device = self.gpu.device();
        let ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("vellum draw ubo"),
            contents: bytemuck::bytes_of(&call.uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let sampler = if call.smooth { &self.programs.linear } else { &self.programs.nearest };
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("vellum draw bind group"),
            layout: self.programs.bind_group_layout(),
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: ubo.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(views[0]) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(views[1]) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(views[2]) },
                wgpu::BindGroupEntry { binding: 4, resource: wgpu::BindingResource::Sampler(sampler) },
            ],
        });

        let pipeline = self.programs.pipeline(device, call.program, call.blend, format);

        let encoder = self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("vellum encoder"),
            })
        });

        let load = match call.clear {
            Some(c) => wgpu::LoadOp::Clear(wgpu_color(c)),
            None => wgpu::LoadOp::Load,
        };
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("vellum draw pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations { load, store: wgpu::StoreOp::Store },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        // An empty scissor still runs the pass so a requested clear happens.
        if let Some(rect) = scissor {
            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, &bind_group, &[]);
            rpass.set_scissor_rect(rect.x as u32, rect.y as u32, rect.w as u32, rect.h as u32);
            rpass.draw(0..6, 0..1);
        }
        Ok(())
    }

    fn clear_pass(&mut self, target: SurfaceId, color: Color) -> Result<()> {
        let device = self.gpu.device();
        let s = self
            .surfaces
            .get(&target.0)
            .with_context(|| format!("unknown surface {target:?}"))?;
        let encoder = self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("vellum encoder"),
            })
        });
        let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("vellum clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &s.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu_color(color)),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        Ok(())
    }

    /// Acquires the window frame for this swap, resizing the swapchain if needed.
    /// Returns false when the frame has to be skipped.
    fn ensure_frame(&mut self, window_size: Size) -> Result<bool> {
        if self.frame.is_some() {
            return Ok(true);
        }

        let wanted = PhysicalSize::new(window_size.width, window_size.height);
        if self.gpu.size() != wanted {
            debug!("reconfiguring swapchain to {}x{}", wanted.width, wanted.height);
            self.gpu.resize(wanted);
        }

        match self.gpu.acquire_frame() {
            Ok(frame) => {
                self.frame = Some(frame);
                Ok(true)
            }
            Err(err) => match self.gpu.handle_surface_error(err) {
                SurfaceErrorAction::Fatal => bail!("window surface lost: out of memory"),
                action => {
                    warn!("skipping window frame ({action:?})");
                    Ok(false)
                }
            },
        }
    }
}

fn texture_descriptor(size: Size) -> wgpu::TextureDescriptor<'static> {
    wgpu::TextureDescriptor {
        label: Some("vellum surface"),
        size: wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SURFACE_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    }
}

fn wgpu_color(c: Color) -> wgpu::Color {
    wgpu::Color {
        r: c.r as f64,
        g: c.g as f64,
        b: c.b as f64,
        a: c.a as f64,
    }
}

fn uv_rect(rect: IntRect, size: Size) -> [f32; 4] {
    let (w, h) = (size.width.max(1) as f32, size.height.max(1) as f32);
    [rect.x as f32 / w, rect.y as f32 / h, rect.w as f32 / w, rect.h as f32 / h]
}

fn pixel_rect(rect: IntRect) -> [f32; 4] {
    [rect.x as f32, rect.y as f32, rect.w as f32, rect.h as f32]
}

impl GraphicsBackend for WgpuBackend {
    fn create_surface(&mut self, size: Size) -> Result<SurfaceId> {
        let id = self.alloc(size)?;
        self.clear_pass(id, Color::black())?;
        Ok(id)
    }

    fn resize_surface(&mut self, id: SurfaceId, size: Size) -> Result<()> {
        if size.is_empty() {
            bail!("cannot resize {id:?} to {}x{}", size.width, size.height);
        }
        let texture = self.gpu.device().create_texture(&texture_descriptor(size));
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let slot = self
            .surfaces
            .get_mut(&id.0)
            .with_context(|| format!("unknown surface {id:?}"))?;
        // Pending commands keep the old texture alive until they complete.
        *slot = GpuSurface { texture, view, size };
        Ok(())
    }

    fn destroy_surface(&mut self, id: SurfaceId) {
        self.surfaces.remove(&id.0);
    }

    fn surface_size(&self, id: SurfaceId) -> Option<Size> {
        self.surfaces.get(&id.0).map(|s| s.size)
    }

    fn upload_bitmap(&mut self, bitmap: &Bitmap) -> Result<SurfaceId> {
        let size = bitmap.size();
        let id = self.alloc(size)?;
        let s = self.surface(id)?;

        self.gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &s.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bitmap.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(size.width * 4),
                rows_per_image: Some(size.height),
            },
            wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(id)
    }

    fn clear(&mut self, target: SurfaceId, color: Color) -> Result<()> {
        self.clear_pass(target, color)
    }

    fn fill_rect(
        &mut self,
        target: SurfaceId,
        rect: IntRect,
        color: Color,
        blend: BlendMode,
    ) -> Result<()> {
        let size = self.surface(target)?.size;
        let mut uniform = DrawUniform::full(size.width, size.height);
        uniform.dst_rect = pixel_rect(rect);
        uniform.color = color.to_array();

        self.record(
            Dest::Surface(target),
            DrawCall {
                program: Program::Flat,
                blend,
                uniform,
                sources: [None; 3],
                smooth: false,
                scissor: self.scissor,
                clear: None,
            },
        )
    }

    fn draw_texture(
        &mut self,
        target: SurfaceId,
        source: SurfaceId,
        src_rect: IntRect,
        dst_rect: IntRect,
        opacity: f32,
        blend: BlendMode,
    ) -> Result<()> {
        if src_rect.is_empty() || dst_rect.is_empty() {
            return Ok(());
        }
        let target_size = self.surface(target)?.size;
        let source_size = self.surface(source)?.size;

        let mut uniform = DrawUniform::full(target_size.width, target_size.height);
        uniform.dst_rect = pixel_rect(dst_rect);
        uniform.src_rect = uv_rect(src_rect, source_size);
        uniform.params[2] = opacity.clamp(0.0, 1.0);

        self.record(
            Dest::Surface(target),
            DrawCall {
                program: Program::Blit,
                blend,
                uniform,
                sources: [Some(source), None, None],
                smooth: false,
                scissor: self.scissor,
                clear: None,
            },
        )
    }

    fn blit(
        &mut self,
        source: SurfaceId,
        src_rect: IntRect,
        target: SurfaceId,
        dst_pos: Vec2i,
    ) -> Result<()> {
        if source == target {
            bail!("blit source and target are the same surface {source:?}");
        }
        let src = self
            .surfaces
            .get(&source.0)
            .with_context(|| format!("unknown surface {source:?}"))?;
        let dst = self
            .surfaces
            .get(&target.0)
            .with_context(|| format!("unknown surface {target:?}"))?;

        // Clip against both surfaces in source space.
        let shift = dst_pos - src_rect.origin();
        let dst_in_src = IntRect::new(-shift.x, -shift.y, dst.size.width as i32, dst.size.height as i32);
        let Some(area) = src_rect
            .intersect(IntRect::from_size(src.size))
            .and_then(|r| r.intersect(dst_in_src))
        else {
            return Ok(());
        };

        let device = self.gpu.device();
        let encoder = self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("vellum encoder"),
            })
        });
        encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &src.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: area.x as u32, y: area.y as u32, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: &dst.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: (area.x + shift.x) as u32,
                    y: (area.y + shift.y) as u32,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d {
                width: area.w as u32,
                height: area.h as u32,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn draw_effect(&mut self, target: SurfaceId, pass: &EffectPass) -> Result<()> {
        let size = self.surface(target)?.size;
        let mut uniform = DrawUniform::full(size.width, size.height);

        let sources = match *pass {
            EffectPass::Gray { source, strength } => {
                uniform.params[2] = strength;
                [Some(source), None, None]
            }
            EffectPass::Sepia { source } => [Some(source), None, None],
            EffectPass::Tint { source, channel } => {
                uniform.color = channel.color().to_array();
                [Some(source), None, None]
            }
            EffectPass::SimpleTransition { frozen, current, progress } => {
                uniform.params[0] = progress;
                [Some(frozen), Some(current), None]
            }
            EffectPass::MapTransition { frozen, current, map, vague, progress } => {
                uniform.params[0] = progress;
                uniform.params[1] = vague;
                [Some(frozen), Some(current), Some(map)]
            }
        };

        self.record(
            Dest::Surface(target),
            DrawCall {
                program: Program::for_pass(pass),
                blend: BlendMode::Replace,
                uniform,
                sources,
                smooth: false,
                scissor: self.scissor,
                clear: None,
            },
        )
    }

    fn scissor(&self) -> Option<IntRect> {
        self.scissor
    }

    fn set_scissor(&mut self, rect: Option<IntRect>) {
        self.scissor = rect;
    }

    fn read_pixels(&mut self, source: SurfaceId) -> Result<Bitmap> {
        self.flush();
        let s = self.surface(source)?;
        readback::read_texture(self.gpu.device(), self.gpu.queue(), &s.texture, s.size)
    }

    fn blit_to_window(
        &mut self,
        source: SurfaceId,
        dst_rect: IntRect,
        window_size: Size,
        smooth: bool,
    ) -> Result<()> {
        self.surface(source)?;
        if !self.ensure_frame(window_size)? {
            return Ok(());
        }

        let PhysicalSize { width, height } = self.gpu.size();
        let mut uniform = DrawUniform::full(width, height);
        uniform.dst_rect = pixel_rect(dst_rect);

        self.record(
            Dest::Window,
            DrawCall {
                program: Program::Blit,
                blend: BlendMode::Replace,
                uniform,
                sources: [Some(source), None, None],
                smooth,
                scissor: None,
                clear: Some(Color::black()),
            },
        )
    }

    fn swap_window(&mut self) -> Result<()> {
        self.flush();
        if let Some(frame) = self.frame.take() {
            self.gpu.present(frame);
        }
        Ok(())
    }
}
