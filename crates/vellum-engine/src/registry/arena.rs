use super::Handle;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational arena.
///
/// Removed slots go to a free list and are reused by later inserts with a bumped
/// generation. Iteration order is slot order, which is not insertion order once
/// slots have been recycled.
pub struct Registry<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    len: usize,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new(), free_list: Vec::new(), len: 0 }
    }

    pub fn insert(&mut self, value: T) -> Handle {
        self.len += 1;

        if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.value = Some(value);
            return Handle { idx, generation: slot.generation };
        }

        let idx = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, value: Some(value) });
        Handle { idx, generation: 0 }
    }

    /// Removes and returns the value. Stale handles return `None`.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.idx as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;

        // Bump generation so old handles immediately fail validation.
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.idx);
        self.len -= 1;
        Some(value)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(handle.idx as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.idx as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            let handle = Handle { idx: idx as u32, generation: slot.generation };
            slot.value.as_ref().map(|v| (handle, v))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(idx, slot)| {
            let handle = Handle { idx: idx as u32, generation: slot.generation };
            slot.value.as_mut().map(|v| (handle, v))
        })
    }

    /// Removes every value, invalidating all outstanding handles.
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(idx as u32);
                out.push(value);
            }
        }
        self.len = 0;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut reg = Registry::new();
        let a = reg.insert("a");
        let b = reg.insert("b");

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get(a), Some(&"a"));
        assert_eq!(reg.remove(a), Some("a"));
        assert_eq!(reg.get(a), None);
        assert_eq!(reg.get(b), Some(&"b"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut reg = Registry::new();
        let first = reg.insert(1);
        reg.remove(first);
        let second = reg.insert(2);

        // Same slot, different generation.
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());
        assert!(!reg.contains(first));
        assert_eq!(reg.remove(first), None);
        assert_eq!(reg.get(second), Some(&2));
    }

    #[test]
    fn double_remove_is_harmless() {
        let mut reg = Registry::new();
        let h = reg.insert(());
        assert!(reg.remove(h).is_some());
        assert!(reg.remove(h).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn drain_empties_and_invalidates() {
        let mut reg = Registry::new();
        let handles: Vec<_> = (0..4).map(|i| reg.insert(i)).collect();
        reg.remove(handles[1]);

        let mut drained = reg.drain();
        drained.sort();
        assert_eq!(drained, vec![0, 2, 3]);
        assert!(reg.is_empty());
        assert!(handles.iter().all(|h| !reg.contains(*h)));

        // Slots are reusable afterwards.
        let h = reg.insert(9);
        assert_eq!(reg.get(h), Some(&9));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn iter_skips_vacant_slots() {
        let mut reg = Registry::new();
        let a = reg.insert('a');
        let b = reg.insert('b');
        let c = reg.insert('c');
        reg.remove(b);

        let seen: Vec<_> = reg.iter().map(|(h, v)| (h, *v)).collect();
        assert_eq!(seen, vec![(a, 'a'), (c, 'c')]);
    }
}
