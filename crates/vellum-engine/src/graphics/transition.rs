use std::path::Path;

use log::{debug, warn};

use crate::bitmap::Bitmap;
use crate::core::GraphicsResult;
use crate::render::{EffectPass, GraphicsBackend, SurfaceId};
use crate::window::WindowHandle;

use super::Graphics;

/// Resources of one running transition. The map surface, if any, is owned by
/// the session and must be released on every exit path.
struct TransitionSession {
    map: Option<SurfaceId>,
    vague: f32,
}

impl TransitionSession {
    /// Uploads the transition map. A map that cannot be loaded degrades to the
    /// plain cross-fade.
    fn open(backend: &mut dyn GraphicsBackend, map: Option<&Path>, vague: i32) -> Self {
        let map = map.and_then(|path| {
            let uploaded = Bitmap::load(path).and_then(|bitmap| backend.upload_bitmap(&bitmap));
            match uploaded {
                Ok(id) => Some(id),
                Err(err) => {
                    warn!("transition map unusable, using cross-fade: {err:#}");
                    None
                }
            }
        });

        Self {
            map,
            vague: vague.clamp(1, 256) as f32 / 256.0,
        }
    }

    fn pass(&self, frozen: SurfaceId, current: SurfaceId, progress: f32) -> EffectPass {
        match self.map {
            Some(map) => EffectPass::MapTransition {
                frozen,
                current,
                map,
                vague: self.vague,
                progress,
            },
            None => EffectPass::SimpleTransition { frozen, current, progress },
        }
    }

    fn release(self, backend: &mut dyn GraphicsBackend) {
        if let Some(map) = self.map {
            backend.destroy_surface(map);
        }
    }
}

impl<B: GraphicsBackend, W: WindowHandle> Graphics<B, W> {
    /// Blends from the frozen snapshot to the live scene over `duration` frames.
    ///
    /// With a map, pixels reveal in order of map luminance (dark first) and
    /// `vague` (clamped to [1, 256]) softens the edge; without one, or if the map
    /// fails to load, the whole frame cross-fades. Only runs while frozen, and
    /// always leaves the facade unfrozen, including when a signal aborts it.
    /// A non-positive duration just unfreezes.
    pub fn transition(&mut self, duration: i32, map: Option<&Path>, vague: i32) -> GraphicsResult<()> {
        self.check_sync_point();
        if !self.frozen {
            return Ok(());
        }
        if duration <= 0 {
            self.frozen = false;
            return Ok(());
        }

        self.set_brightness(255);
        let session = TransitionSession::open(&mut self.backend, map, vague);
        debug!(
            "transition over {duration} frames ({})",
            if session.map.is_some() { "map" } else { "cross-fade" }
        );

        let result = self.run_transition(&session, duration);

        session.release(&mut self.backend);
        self.frozen = false;
        result
    }

    fn run_transition(&mut self, session: &TransitionSession, duration: i32) -> GraphicsResult<()> {
        // After compositing, front holds the new scene and back is idle; the back
        // buffer is the blend target for the whole loop.
        self.compositor.composite(&mut self.backend, &mut self.scene)?;
        let current = self.compositor.front();
        let scratch = self.compositor.back();

        for i in 0..duration {
            self.check_signals()?;
            self.check_sync_point();

            let progress = i as f32 / duration as f32;
            self.backend.set_scissor(None);
            self.backend
                .draw_effect(scratch, &session.pass(self.frozen_surface, current, progress))?;

            self.check_resize();
            self.present(scratch)?;
        }
        Ok(())
    }
}
