//! Typed per-frame arena with stack-style checkpoints.
//!
//! Values are addressed by [`ArenaId`] instead of references so that nodes
//! can point at their parents. A [`Checkpoint`] records the high-water mark
//! and truncates back to it when dropped; it holds the arena mutably, so no
//! borrow of checkpointed values can outlive it.

use std::{
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

/// Index of a value living in a [`FrameArena<T>`].
pub struct ArenaId<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ArenaId<T> {
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for ArenaId<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for ArenaId<T> {}

impl<T> PartialEq for ArenaId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}
impl<T> Eq for ArenaId<T> {}

impl<T> fmt::Debug for ArenaId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

#[derive(Debug)]
pub struct FrameArena<T> {
    items: Vec<T>,
}

impl<T> Default for FrameArena<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> FrameArena<T> {
    pub fn alloc(&mut self, value: T) -> ArenaId<T> {
        let index = self.items.len() as u32;
        self.items.push(value);
        ArenaId {
            index,
            _marker: PhantomData,
        }
    }

    /// Panics on an id released by an earlier checkpoint.
    #[inline]
    pub fn get(&self, id: ArenaId<T>) -> &T {
        &self.items[id.index()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop everything; capacity is kept for the next frame.
    pub fn reset(&mut self) {
        self.items.clear();
    }

    /// Save the high-water mark; it is restored when the guard drops.
    pub fn checkpoint(&mut self) -> Checkpoint<'_, T> {
        let mark = self.items.len();
        Checkpoint { arena: self, mark }
    }
}

/// Scope guard returned by [`FrameArena::checkpoint`].
pub struct Checkpoint<'a, T> {
    arena: &'a mut FrameArena<T>,
    mark: usize,
}

impl<T> Checkpoint<'_, T> {
    /// Values allocated since the checkpoint was taken.
    pub fn fresh(&self) -> &[T] {
        &self.arena.items[self.mark..]
    }
}

impl<T> Deref for Checkpoint<'_, T> {
    type Target = FrameArena<T>;
    fn deref(&self) -> &Self::Target {
        self.arena
    }
}

impl<T> DerefMut for Checkpoint<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.arena
    }
}

impl<T> Drop for Checkpoint<'_, T> {
    fn drop(&mut self) {
        self.arena.items.truncate(self.mark);
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_and_get() {
        let mut arena = FrameArena::default();
        let a = arena.alloc("a");
        let b = arena.alloc("b");
        assert_eq!(*arena.get(a), "a");
        assert_eq!(*arena.get(b), "b");
        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn checkpoint_restores_high_water_mark() {
        let mut arena = FrameArena::default();
        let keep = arena.alloc(1);
        {
            let mut cp = arena.checkpoint();
            cp.alloc(2);
            cp.alloc(3);
            assert_eq!(cp.fresh(), &[2, 3]);
            assert_eq!(cp.len(), 3);
        }
        assert_eq!(arena.len(), 1);
        assert_eq!(*arena.get(keep), 1);
    }

    #[test]
    fn nested_checkpoints_unwind_in_order() {
        let mut arena = FrameArena::default();
        let mut outer = arena.checkpoint();
        outer.alloc('x');
        {
            let mut inner = outer.checkpoint();
            inner.alloc('y');
            assert_eq!(inner.len(), 2);
        }
        assert_eq!(outer.fresh(), &['x']);
        drop(outer);
        assert!(arena.is_empty());
    }

    #[test]
    fn reset_empties() {
        let mut arena = FrameArena::default();
        arena.alloc(0u8);
        arena.reset();
        assert!(arena.is_empty());
    }
}
