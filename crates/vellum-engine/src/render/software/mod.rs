//! CPU reference backend.
//!
//! Implements the same programs as the wgpu backend with plain loops over RGBA8
//! bitmaps. Used for headless runs and by the test-suite; it also records what
//! reached the window so tests can assert on presented frames.

mod raster;

use std::collections::HashMap;

use anyhow::{Context, Result, bail};

use crate::bitmap::Bitmap;
use crate::coords::{Color, IntRect, Size, Vec2i};

use self::raster::Rgba;
use super::{BlendMode, EffectPass, GraphicsBackend, SurfaceId};

#[derive(Default)]
pub struct SoftwareBackend {
    surfaces: HashMap<u32, Bitmap>,
    next_id: u32,
    scissor: Option<IntRect>,

    /// Window frame being drawn and the last presented one.
    pending_window: Option<Bitmap>,
    presented_window: Option<Bitmap>,

    presented: usize,
    allocations: usize,
    transition_progress: Vec<f32>,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Introspection --

    /// Number of `swap_window` calls so far.
    #[inline]
    pub fn presented_frames(&self) -> usize {
        self.presented
    }

    /// Last frame shown in the window.
    pub fn window_frame(&self) -> Option<&Bitmap> {
        self.presented_window.as_ref()
    }

    /// Surface creations and reallocations so far.
    #[inline]
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    #[inline]
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Progress of every transition pass drawn, in order.
    pub fn transition_progress(&self) -> &[f32] {
        &self.transition_progress
    }

    // -- Internals --

    fn surface(&self, id: SurfaceId) -> Result<&Bitmap> {
        self.surfaces
            .get(&id.0)
            .with_context(|| format!("unknown or aliased surface {id:?}"))
    }

    /// Runs `f` with the target detached so sources can be read alongside it.
    /// A surface used as its own source is rejected as unknown.
    fn with_target<F>(&mut self, target: SurfaceId, f: F) -> Result<()>
    where
        F: FnOnce(&mut Bitmap, &Self) -> Result<()>,
    {
        let mut dst = self
            .surfaces
            .remove(&target.0)
            .with_context(|| format!("unknown surface {target:?}"))?;
        let result = f(&mut dst, &*self);
        self.surfaces.insert(target.0, dst);
        result
    }

    /// Target area after clipping against the surface and the scissor.
    fn clip(&self, target: &Bitmap, rect: IntRect) -> Option<IntRect> {
        let rect = rect.intersect(target.rect())?;
        match self.scissor {
            Some(scissor) => rect.intersect(scissor),
            None => Some(rect),
        }
    }
}

fn read(bmp: &Bitmap, x: i32, y: i32) -> Rgba {
    match bmp.pixel(x as u32, y as u32) {
        Some(px) => raster::load(px),
        None => [0.0; 4],
    }
}

fn write(bmp: &mut Bitmap, x: i32, y: i32, c: Rgba) {
    bmp.set_pixel(x as u32, y as u32, raster::store(c));
}

/// Nearest sample of `src` at the pixel of a `target`-sized grid.
fn sample_scaled(src: &Bitmap, target: Size, x: i32, y: i32) -> Rgba {
    let sx = (x as u64 * src.width() as u64 / target.width.max(1) as u64) as i32;
    let sy = (y as u64 * src.height() as u64 / target.height.max(1) as u64) as i32;
    read(src, sx, sy)
}

impl GraphicsBackend for SoftwareBackend {
    fn create_surface(&mut self, size: Size) -> Result<SurfaceId> {
        if size.is_empty() {
            bail!("cannot create an empty {}x{} surface", size.width, size.height);
        }
        let id = SurfaceId(self.next_id);
        self.next_id += 1;

        let mut bmp = Bitmap::new(size);
        bmp.fill_rect(bmp.rect(), Color::black());
        bmp.take_modified();
        self.surfaces.insert(id.0, bmp);
        self.allocations += 1;
        Ok(id)
    }

    fn resize_surface(&mut self, id: SurfaceId, size: Size) -> Result<()> {
        if size.is_empty() {
            bail!("cannot resize {id:?} to {}x{}", size.width, size.height);
        }
        let slot = self
            .surfaces
            .get_mut(&id.0)
            .with_context(|| format!("unknown surface {id:?}"))?;
        *slot = Bitmap::new(size);
        self.allocations += 1;
        Ok(())
    }

    fn destroy_surface(&mut self, id: SurfaceId) {
        self.surfaces.remove(&id.0);
    }

    fn surface_size(&self, id: SurfaceId) -> Option<Size> {
        self.surfaces.get(&id.0).map(Bitmap::size)
    }

    fn upload_bitmap(&mut self, bitmap: &Bitmap) -> Result<SurfaceId> {
        let id = self.create_surface(bitmap.size())?;
        let mut copy = bitmap.clone();
        copy.take_modified();
        self.surfaces.insert(id.0, copy);
        Ok(id)
    }

    fn clear(&mut self, target: SurfaceId, color: Color) -> Result<()> {
        let px = color.to_rgba8();
        let bmp = self
            .surfaces
            .get_mut(&target.0)
            .with_context(|| format!("unknown surface {target:?}"))?;
        for chunk in bmp.as_bytes_mut().chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
        Ok(())
    }

    fn fill_rect(
        &mut self,
        target: SurfaceId,
        rect: IntRect,
        color: Color,
        blend: BlendMode,
    ) -> Result<()> {
        let src = raster::from_color(color);
        self.with_target(target, |dst, this| {
            let Some(area) = this.clip(dst, rect) else {
                return Ok(());
            };
            for y in area.y..area.bottom() {
                for x in area.x..area.right() {
                    let out = raster::blend(src, read(dst, x, y), blend);
                    write(dst, x, y, out);
                }
            }
            Ok(())
        })
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
        let opacity = opacity.clamp(0.0, 1.0);
        self.with_target(target, |dst, this| {
            let src = this.surface(source)?;
            let Some(area) = this.clip(dst, dst_rect) else {
                return Ok(());
            };
            for y in area.y..area.bottom() {
                let sy = src_rect.y + (y - dst_rect.y) * src_rect.h / dst_rect.h;
                for x in area.x..area.right() {
                    let sx = src_rect.x + (x - dst_rect.x) * src_rect.w / dst_rect.w;
                    let mut s = read(src, sx, sy);
                    s[3] *= opacity;
                    let out = raster::blend(s, read(dst, x, y), blend);
                    write(dst, x, y, out);
                }
            }
            Ok(())
        })
    }

    fn blit(
        &mut self,
        source: SurfaceId,
        src_rect: IntRect,
        target: SurfaceId,
        dst_pos: Vec2i,
    ) -> Result<()> {
        self.with_target(target, |dst, this| {
            let src = this.surface(source)?;
            let Some(src_area) = src_rect.intersect(src.rect()) else {
                return Ok(());
            };
            let shift = dst_pos - src_rect.origin();
            for y in src_area.y..src_area.bottom() {
                for x in src_area.x..src_area.right() {
                    if let Some(px) = src.pixel(x as u32, y as u32) {
                        let (dx, dy) = (x + shift.x, y + shift.y);
                        if dx >= 0 && dy >= 0 {
                            dst.set_pixel(dx as u32, dy as u32, px);
                        }
                    }
                }
            }
            Ok(())
        })
    }

    fn draw_effect(&mut self, target: SurfaceId, pass: &EffectPass) -> Result<()> {
        let pass = *pass;
        self.with_target(target, |dst, this| {
            let Some(area) = this.clip(dst, dst.rect()) else {
                return Ok(());
            };
            let size = dst.size();

            match pass {
                EffectPass::Gray { source, strength } => {
                    let src = this.surface(source)?;
                    for y in area.y..area.bottom() {
                        for x in area.x..area.right() {
                            let c = sample_scaled(src, size, x, y);
                            write(dst, x, y, raster::gray(c, strength));
                        }
                    }
                }
                EffectPass::Sepia { source } => {
                    let src = this.surface(source)?;
                    for y in area.y..area.bottom() {
                        for x in area.x..area.right() {
                            let c = sample_scaled(src, size, x, y);
                            write(dst, x, y, raster::sepia(c));
                        }
                    }
                }
                EffectPass::Tint { source, channel } => {
                    let src = this.surface(source)?;
                    let color = channel.color();
                    for y in area.y..area.bottom() {
                        for x in area.x..area.right() {
                            let c = sample_scaled(src, size, x, y);
                            write(dst, x, y, raster::tint(c, color));
                        }
                    }
                }
                EffectPass::SimpleTransition { frozen, current, progress } => {
                    let frozen = this.surface(frozen)?;
                    let current = this.surface(current)?;
                    for y in area.y..area.bottom() {
                        for x in area.x..area.right() {
                            let a = sample_scaled(frozen, size, x, y);
                            let b = sample_scaled(current, size, x, y);
                            write(dst, x, y, raster::mix(a, b, progress));
                        }
                    }
                }
                EffectPass::MapTransition { frozen, current, map, vague, progress } => {
                    let frozen = this.surface(frozen)?;
                    let current = this.surface(current)?;
                    let map = this.surface(map)?;
                    for y in area.y..area.bottom() {
                        for x in area.x..area.right() {
                            let m = sample_scaled(map, size, x, y)[0];
                            let t = raster::map_weight(m, progress, vague);
                            let a = sample_scaled(frozen, size, x, y);
                            let b = sample_scaled(current, size, x, y);
                            write(dst, x, y, raster::mix(b, a, t));
                        }
                    }
                }
            }
            Ok(())
        })?;

        if let Some(progress) = pass.progress() {
            self.transition_progress.push(progress);
        }
        Ok(())
    }

    fn scissor(&self) -> Option<IntRect> {
        self.scissor
    }

    fn set_scissor(&mut self, rect: Option<IntRect>) {
        self.scissor = rect;
    }

    fn read_pixels(&mut self, source: SurfaceId) -> Result<Bitmap> {
        let mut copy = self.surface(source)?.clone();
        copy.take_modified();
        Ok(copy)
    }

    fn blit_to_window(
        &mut self,
        source: SurfaceId,
        dst_rect: IntRect,
        window_size: Size,
        _smooth: bool,
    ) -> Result<()> {
        // Field borrow so the pending frame can be taken alongside.
        let src = self
            .surfaces
            .get(&source.0)
            .with_context(|| format!("unknown surface {source:?}"))?;

        let mut frame = match self.pending_window.take() {
            Some(frame) if frame.size() == window_size => frame,
            _ => Bitmap::new(window_size),
        };
        let black = Color::black().to_rgba8();
        for chunk in frame.as_bytes_mut().chunks_exact_mut(4) {
            chunk.copy_from_slice(&black);
        }

        if let Some(area) = dst_rect.intersect(frame.rect()) {
            for y in area.y..area.bottom() {
                for x in area.x..area.right() {
                    let sx = ((x - dst_rect.x) as i64 * src.width() as i64 / dst_rect.w as i64) as i32;
                    let sy = ((y - dst_rect.y) as i64 * src.height() as i64 / dst_rect.h as i64) as i32;
                    if let Some(px) = src.pixel(sx as u32, sy as u32) {
                        frame.set_pixel(x as u32, y as u32, px);
                    }
                }
            }
        }

        self.pending_window = Some(frame);
        Ok(())
    }

    fn swap_window(&mut self) -> Result<()> {
        if let Some(frame) = self.pending_window.take() {
            // Recycle the previously shown frame as the next pending buffer.
            self.pending_window = self.presented_window.replace(frame);
        }
        self.presented += 1;
        Ok(())
    }
}
