use core::cmp::Ordering;

use crate::registry::Handle;

/// Paint order of a scene entry.
///
/// 1) `z` ascending (back to front)
/// 2) `order` ascending (insertion order breaks ties)
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct SortKey {
    pub z: i32,
    pub order: u64,
    pub handle: Handle,
}

impl Ord for SortKey {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.z.cmp(&other.z).then(self.order.cmp(&other.order))
    }
}

impl PartialOrd for SortKey {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
