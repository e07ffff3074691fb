//! Generational arena holding every box and line box of a layout pass.
//!
//! Handles are `(index, generation)` pairs. Freeing a slot bumps its
//! generation, so a handle kept across a `destroy` or `release` resolves to
//! `None` instead of aliasing whatever reuses the slot.

use std::marker::PhantomData;

use serde::Serialize;

/// Raw generational index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GenIndex {
    /// Slot position.
    pub index: u32,
    /// Generation of the slot when the handle was issued.
    pub generation: u32,
}

/// Typed handle into an [`Arena`].
pub trait ArenaKey: Copy {
    /// Wrap a raw index.
    fn from_index(index: GenIndex) -> Self;
    /// Unwrap to the raw index.
    fn index(self) -> GenIndex;
}

/// Handle to a [`LayoutBox`](crate::layout_box::LayoutBox).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BoxId(GenIndex);

/// Handle to a [`LineBox`](crate::line_box::LineBox).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LineId(GenIndex);

impl ArenaKey for BoxId {
    fn from_index(index: GenIndex) -> Self {
        Self(index)
    }
    fn index(self) -> GenIndex {
        self.0
    }
}

impl ArenaKey for LineId {
    fn from_index(index: GenIndex) -> Self {
        Self(index)
    }
    fn index(self) -> GenIndex {
        self.0
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
    next_free: Option<u32>,
}

/// Slot allocator with a free list.
pub struct Arena<K, T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
    _key: PhantomData<K>,
}

impl<K: ArenaKey, T> Default for Arena<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey, T> Arena<K, T> {
    /// An empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
            _key: PhantomData,
        }
    }

    /// Store `value` and return its handle.
    pub fn allocate(&mut self, value: T) -> K {
        if let Some(i) = self.free_head {
            let slot = &mut self.slots[i as usize];
            self.free_head = slot.next_free.take();
            slot.value = Some(value);
            self.len += 1;
            return K::from_index(GenIndex {
                index: i,
                generation: slot.generation,
            });
        }

        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
            next_free: None,
        });
        self.len += 1;
        K::from_index(GenIndex {
            index,
            generation: 0,
        })
    }

    /// Borrow the value behind `id`, if it is still alive.
    #[must_use]
    pub fn get(&self, id: K) -> Option<&T> {
        let raw = id.index();
        let slot = self.slots.get(raw.index as usize)?;
        if slot.generation != raw.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Mutably borrow the value behind `id`, if it is still alive.
    pub fn get_mut(&mut self, id: K) -> Option<&mut T> {
        let raw = id.index();
        let slot = self.slots.get_mut(raw.index as usize)?;
        if slot.generation != raw.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Free the slot behind `id` and return its value.
    pub fn deallocate(&mut self, id: K) -> Option<T> {
        let raw = id.index();
        let slot = self.slots.get_mut(raw.index as usize)?;
        if slot.generation != raw.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        slot.next_free = self.free_head;
        self.free_head = Some(raw.index);
        self.len -= 1;
        Some(value)
    }

    /// Whether `id` is alive.
    #[must_use]
    pub fn contains(&self, id: K) -> bool {
        self.get(id).is_some()
    }

    /// Number of live values.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no value is alive.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Free every slot at once. All outstanding handles become stale.
    pub fn clear(&mut self) {
        let total = self.slots.len();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            slot.next_free = if i + 1 < total {
                u32::try_from(i + 1).ok()
            } else {
                None
            };
        }
        self.free_head = if total > 0 { Some(0) } else { None };
        self.len = 0;
    }

    /// Iterate over live `(handle, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let value = slot.value.as_ref()?;
            Some((
                K::from_index(GenIndex {
                    index: u32::try_from(i).ok()?,
                    generation: slot.generation,
                }),
                value,
            ))
        })
    }

    /// Iterate mutably over live `(handle, value)` pairs in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            let value = slot.value.as_mut()?;
            Some((
                K::from_index(GenIndex {
                    index: u32::try_from(i).ok()?,
                    generation,
                }),
                value,
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_handle_after_deallocate() {
        let mut arena: Arena<BoxId, &str> = Arena::new();
        let a = arena.allocate("a");
        assert_eq!(arena.deallocate(a), Some("a"));
        let b = arena.allocate("b");
        assert_eq!(a.index().index, b.index().index, "slot is reused");
        assert_eq!(arena.get(a), None, "old handle must not see the new value");
        assert_eq!(arena.get(b), Some(&"b"));
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut arena: Arena<LineId, u32> = Arena::new();
        let ids: Vec<LineId> = (0..4).map(|v| arena.allocate(v)).collect();
        arena.clear();
        assert!(arena.is_empty());
        assert!(ids.iter().all(|id| !arena.contains(*id)));
        let again = arena.allocate(9);
        assert_eq!(arena.get(again), Some(&9));
        assert_eq!(arena.len(), 1);
    }
}
