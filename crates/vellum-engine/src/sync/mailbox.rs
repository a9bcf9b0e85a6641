use std::sync::atomic::{AtomicU64, Ordering};

use crate::coords::Size;

const EMPTY: u64 = 0;

/// Latest-value mailbox for window size notifications.
///
/// Single writer (event thread), single reader (render thread). A newer post
/// overwrites an unread one; only the most recent size matters.
#[derive(Debug, Default)]
pub struct ResizeMailbox {
    packed: AtomicU64,
}

impl ResizeMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a window size. Zero-area sizes are ignored (minimized windows).
    pub fn post(&self, size: Size) {
        if size.is_empty() {
            return;
        }
        let packed = (u64::from(size.width) << 32) | u64::from(size.height);
        self.packed.store(packed, Ordering::Release);
    }

    /// Takes the pending size, if any.
    pub fn take(&self) -> Option<Size> {
        match self.packed.swap(EMPTY, Ordering::AcqRel) {
            EMPTY => None,
            packed => Some(Size::new((packed >> 32) as u32, packed as u32)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_returns_latest_post_once() {
        let mb = ResizeMailbox::new();
        assert_eq!(mb.take(), None);

        mb.post(Size::new(800, 600));
        mb.post(Size::new(1024, 768));
        assert_eq!(mb.take(), Some(Size::new(1024, 768)));
        assert_eq!(mb.take(), None);
    }

    #[test]
    fn zero_area_is_ignored() {
        let mb = ResizeMailbox::new();
        mb.post(Size::new(0, 600));
        assert_eq!(mb.take(), None);
    }
}
