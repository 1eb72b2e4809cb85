//! Dense, ID-indexed storage for simulation entities.
//!
//! Signals, processes and tristate buses live in [`Arena`]s owned by the
//! simulator and are referred to everywhere else by copyable [`ArenaId`]s.
//! Nothing is ever removed, so an ID handed out stays valid.

use std::marker::PhantomData;

/// A `u32`-backed key into an [`Arena`].
pub trait ArenaId: Copy {
    /// Wraps a slot index.
    fn from_raw(index: u32) -> Self;

    /// The slot index.
    fn as_raw(self) -> u32;
}

/// An append-only vector addressed by typed IDs.
#[derive(Debug, Clone)]
pub struct Arena<I: ArenaId, T> {
    slots: Vec<T>,
    key: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// An empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            key: PhantomData,
        }
    }

    /// Stores `item` and returns its ID.
    pub fn alloc(&mut self, item: T) -> I {
        self.slots.push(item);
        I::from_raw((self.slots.len() - 1) as u32)
    }

    /// The item behind an ID this arena allocated.
    ///
    /// Panics on an ID from another arena; use [`try_get`](Self::try_get)
    /// for IDs that come from outside.
    pub fn get(&self, id: I) -> &T {
        &self.slots[id.as_raw() as usize]
    }

    /// Mutable counterpart of [`get`](Self::get).
    pub fn get_mut(&mut self, id: I) -> &mut T {
        &mut self.slots[id.as_raw() as usize]
    }

    /// The item behind `id`, if this arena allocated it.
    pub fn try_get(&self, id: I) -> Option<&T> {
        self.slots.get(id.as_raw() as usize)
    }

    /// Mutable counterpart of [`try_get`](Self::try_get).
    pub fn try_get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots.get_mut(id.as_raw() as usize)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True before the first allocation.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// `(id, item)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        (0u32..).zip(&self.slots).map(|(i, item)| (I::from_raw(i), item))
    }
}
