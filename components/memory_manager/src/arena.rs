//! Slot arenas for heap cells.
//!
//! Cells are addressed by stable `u32` indices. Freed slots go on a free list
//! and are reused by later insertions, so an index is only meaningful while
//! the cell it was issued for is alive.

use crate::trace::MarkBitmap;

/// Index-addressed storage for one kind of heap cell.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Stores `value` and returns its index.
    pub fn insert(&mut self, value: T) -> u32 {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(value);
            return index;
        }
        self.slots.push(Some(value));
        (self.slots.len() - 1) as u32
    }

    /// Returns the cell at `index`, if it is alive.
    #[inline]
    pub fn get(&self, index: u32) -> Option<&T> {
        self.slots.get(index as usize).and_then(|slot| slot.as_ref())
    }

    /// Returns the cell at `index` mutably, if it is alive.
    #[inline]
    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.slots.get_mut(index as usize).and_then(|slot| slot.as_mut())
    }

    /// Frees the cell at `index`, returning it.
    pub fn remove(&mut self, index: u32) -> Option<T> {
        let value = self.slots.get_mut(index as usize)?.take()?;
        self.free.push(index);
        self.live -= 1;
        Some(value)
    }

    /// Returns true if `index` names a live cell.
    pub fn contains(&self, index: u32) -> bool {
        self.get(index).is_some()
    }

    /// Number of live cells.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if no cell is alive.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots ever allocated, live or free. Mark bitmaps are sized
    /// from this.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Iterates live cells with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (index as u32, value)))
    }

    /// Frees every live cell whose bit is clear in `marks`, handing each freed
    /// cell to `on_free`. Returns the number of freed cells.
    pub fn sweep(&mut self, marks: &MarkBitmap, mut on_free: impl FnMut(u32, T)) -> usize {
        let mut freed = 0;
        for index in 0..self.slots.len() {
            if self.slots[index].is_none() || marks.is_set(index as u32) {
                continue;
            }
            if let Some(value) = self.slots[index].take() {
                self.free.push(index as u32);
                self.live -= 1;
                freed += 1;
                on_free(index as u32, value);
            }
        }
        freed
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
