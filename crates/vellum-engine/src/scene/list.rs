use anyhow::Result;

use crate::registry::{Handle, Registry};
use crate::render::{GraphicsBackend, ScreenGeometry};

use super::key::SortKey;
use super::{DrawTarget, Drawable};

struct Entry {
    drawable: Box<dyn Drawable>,
    order: u64,
}

/// Ordered collection of drawables composited every frame.
///
/// Paint order is re-derived on each draw since `z()` may change between frames;
/// the key buffer is reused, so there is no per-frame allocation once warmed.
#[derive(Default)]
pub struct Scene {
    entries: Registry<Entry>,
    next_order: u64,
    sorted: Vec<SortKey>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, drawable: Box<dyn Drawable>) -> Handle {
        let order = self.next_order;
        self.next_order += 1;
        self.entries.insert(Entry { drawable, order })
    }

    /// Detaches an entry without releasing its backend resources.
    pub fn remove(&mut self, handle: Handle) -> Option<Box<dyn Drawable>> {
        self.entries.remove(handle).map(|e| e.drawable)
    }

    pub fn get(&self, handle: Handle) -> Option<&dyn Drawable> {
        self.entries.get(handle).map(|e| e.drawable.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Box<dyn Drawable>> {
        self.entries.get_mut(handle).map(|e| &mut e.drawable)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handles in paint order (back to front).
    pub fn paint_order(&mut self) -> Vec<Handle> {
        self.rebuild_sorted();
        self.sorted.iter().map(|k| k.handle).collect()
    }

    /// Removes every entry and releases it.
    pub(crate) fn clear(&mut self, backend: &mut dyn GraphicsBackend) {
        for mut drawable in self.entries.drain().into_iter().map(|e| e.drawable) {
            drawable.release(backend);
        }
        self.sorted.clear();
    }

    pub(crate) fn prepare_all(&mut self) {
        for (_, entry) in self.entries.iter_mut() {
            entry.drawable.prepare();
        }
    }

    pub(crate) fn draw_all(&mut self, target: &mut DrawTarget<'_>) -> Result<()> {
        self.rebuild_sorted();
        for i in 0..self.sorted.len() {
            let handle = self.sorted[i].handle;
            if let Some(entry) = self.entries.get_mut(handle) {
                if entry.drawable.visible() {
                    entry.drawable.draw(target)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn notify_geometry_changed(&mut self, geometry: &ScreenGeometry) {
        for (_, entry) in self.entries.iter_mut() {
            entry.drawable.on_geometry_changed(geometry);
        }
    }

    fn rebuild_sorted(&mut self) {
        self.sorted.clear();
        self.sorted.extend(self.entries.iter().map(|(handle, e)| SortKey {
            z: e.drawable.z(),
            order: e.order,
            handle,
        }));
        self.sorted.sort_unstable();
    }
}
