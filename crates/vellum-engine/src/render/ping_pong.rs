use anyhow::Result;

use crate::coords::{Color, Size};

use super::{GraphicsBackend, SurfaceId};

/// Two equally sized render surfaces.
///
/// Drawing always targets `back()`; `swap()` publishes it as `front()`, which is
/// what effects, snapshots and presentation read.
#[derive(Debug)]
pub struct PingPong {
    surfaces: [SurfaceId; 2],
    back: usize,
    size: Size,
}

impl PingPong {
    pub fn new(backend: &mut dyn GraphicsBackend, size: Size) -> Result<Self> {
        let a = backend.create_surface(size)?;
        let b = backend.create_surface(size)?;
        Ok(Self { surfaces: [a, b], back: 0, size })
    }

    #[inline]
    pub fn back(&self) -> SurfaceId {
        self.surfaces[self.back]
    }

    #[inline]
    pub fn front(&self) -> SurfaceId {
        self.surfaces[self.back ^ 1]
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Flips the roles of the two surfaces. No pixels move.
    #[inline]
    pub fn swap(&mut self) {
        self.back ^= 1;
    }

    /// Reallocates both surfaces. Content is undefined until the next composite.
    pub fn resize(&mut self, backend: &mut dyn GraphicsBackend, size: Size) -> Result<()> {
        for id in self.surfaces {
            backend.resize_surface(id, size)?;
        }
        self.size = size;
        Ok(())
    }

    /// Clears both surfaces to opaque black.
    pub fn clear_buffers(&self, backend: &mut dyn GraphicsBackend) -> Result<()> {
        for id in self.surfaces {
            backend.clear(id, Color::black())?;
        }
        Ok(())
    }

    pub fn destroy(self, backend: &mut dyn GraphicsBackend) {
        for id in self.surfaces {
            backend.destroy_surface(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::SoftwareBackend;

    fn pair() -> (SoftwareBackend, PingPong) {
        let mut backend = SoftwareBackend::new();
        let pp = PingPong::new(&mut backend, Size::new(8, 6)).unwrap();
        (backend, pp)
    }

    #[test]
    fn front_and_back_never_alias() {
        let (_, mut pp) = pair();
        for _ in 0..3 {
            assert_ne!(pp.front(), pp.back());
            pp.swap();
        }
    }

    #[test]
    fn swap_is_its_own_inverse() {
        let (_, mut pp) = pair();
        let (front, back) = (pp.front(), pp.back());

        pp.swap();
        assert_eq!((pp.front(), pp.back()), (back, front));
        pp.swap();
        assert_eq!((pp.front(), pp.back()), (front, back));
    }

    #[test]
    fn swap_publishes_what_was_drawn() {
        let (mut backend, mut pp) = pair();
        backend.clear(pp.back(), Color::white()).unwrap();
        pp.swap();

        let bmp = backend.read_pixels(pp.front()).unwrap();
        assert_eq!(bmp.pixel(0, 0), Some([255; 4]));
    }

    #[test]
    fn resize_reallocates_both() {
        let (mut backend, mut pp) = pair();
        pp.resize(&mut backend, Size::new(16, 9)).unwrap();

        assert_eq!(pp.size(), Size::new(16, 9));
        assert_eq!(backend.surface_size(pp.front()), Some(Size::new(16, 9)));
        assert_eq!(backend.surface_size(pp.back()), Some(Size::new(16, 9)));
    }

    #[test]
    fn destroy_frees_both_surfaces() {
        let (mut backend, pp) = pair();
        assert_eq!(backend.surface_count(), 2);
        pp.destroy(&mut backend);
        assert_eq!(backend.surface_count(), 0);
    }
}
