use core::fmt;

/// A handle into a [`Registry`](super::Registry).
///
/// Carries the slot index and the generation the slot had at insertion time, so
/// a handle kept after removal cannot resolve to whatever reuses the slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl Handle {
    /// Raw slot index (diagnostics only).
    #[inline]
    pub const fn index(self) -> u32 {
        self.idx
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}@gen{})", self.idx, self.generation)
    }
}
