use log::debug;

use super::{Handle, Registry};

/// An engine-managed resource with an explicit lifetime.
///
/// Everything still registered when the game resets is disposed by the facade.
pub trait Disposable {
    /// Releases the underlying resources. Called at most once by the registry.
    fn dispose(&mut self);

    /// Short type name used in diagnostics.
    fn kind(&self) -> &'static str {
        "disposable"
    }
}

/// Live-disposable registry owned by the graphics facade.
#[derive(Default)]
pub struct Disposables {
    entries: Registry<Box<dyn Disposable>>,
}

impl Disposables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, item: Box<dyn Disposable>) -> Handle {
        self.entries.insert(item)
    }

    /// Removes an entry without disposing it (the owner disposed it itself).
    pub fn unregister(&mut self, handle: Handle) -> Option<Box<dyn Disposable>> {
        self.entries.remove(handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains(handle)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Disposes every entry and clears the registry. Returns how many were disposed.
    pub fn dispose_all(&mut self) -> usize {
        let mut drained = self.entries.drain();
        for item in drained.iter_mut() {
            debug!("disposing {}", item.kind());
            item.dispose();
        }
        drained.len()
    }
}
