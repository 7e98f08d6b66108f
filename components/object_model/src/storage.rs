//! Per-object property storage.
//!
//! Small objects keep their slots inline in the object cell. Once a
//! structure asks for more than [`INLINE_STORAGE_CAPACITY`] slots the storage
//! moves to a separately allocated vector, which then doubles on each growth.

use core_types::Value;
use memory_manager::{Trace, Tracer};
use std::mem;

/// Slots held inline in the object cell.
pub const INLINE_STORAGE_CAPACITY: u32 = 4;

/// Size of the first external slot array.
pub const BASE_EXTERNAL_STORAGE_CAPACITY: u32 = 16;

/// Capacity that follows `current` in the growth policy.
pub fn next_capacity(current: u32) -> u32 {
    if current <= INLINE_STORAGE_CAPACITY {
        BASE_EXTERNAL_STORAGE_CAPACITY
    } else {
        current.saturating_mul(2)
    }
}

/// Smallest capacity reachable from `current` by the growth policy that can
/// hold `offset`.
pub fn capacity_for_offset(current: u32, offset: u32) -> u32 {
    let mut capacity = current;
    while offset >= capacity {
        capacity = next_capacity(capacity);
    }
    capacity
}

/// Slot array addressed by structure offsets.
#[derive(Debug, Clone)]
pub enum PropertyStorage {
    /// Slots co-located with the object header
    Inline([Value; INLINE_STORAGE_CAPACITY as usize]),
    /// Separately allocated slots
    External(Vec<Value>),
}

impl Default for PropertyStorage {
    fn default() -> Self {
        PropertyStorage::Inline(Default::default())
    }
}

impl PropertyStorage {
    /// Creates empty inline storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots.
    pub fn capacity(&self) -> u32 {
        match self {
            PropertyStorage::Inline(slots) => slots.len() as u32,
            PropertyStorage::External(slots) => slots.len() as u32,
        }
    }

    /// Returns true while the slots are inline.
    pub fn is_inline(&self) -> bool {
        matches!(self, PropertyStorage::Inline(_))
    }

    fn slots(&self) -> &[Value] {
        match self {
            PropertyStorage::Inline(slots) => slots,
            PropertyStorage::External(slots) => slots,
        }
    }

    fn slots_mut(&mut self) -> &mut [Value] {
        match self {
            PropertyStorage::Inline(slots) => slots,
            PropertyStorage::External(slots) => slots,
        }
    }

    /// Reads the slot at `offset`.
    #[inline]
    pub fn get(&self, offset: u32) -> Option<&Value> {
        self.slots().get(offset as usize)
    }

    /// Writes the slot at `offset`. Returns false if it is out of range.
    #[inline]
    pub fn set(&mut self, offset: u32, value: Value) -> bool {
        match self.slots_mut().get_mut(offset as usize) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Resets the slot at `offset` to undefined.
    pub fn clear(&mut self, offset: u32) {
        self.set(offset, Value::Undefined);
    }

    /// Extra heap bytes needed to grow to `capacity`.
    pub fn growth_bytes(&self, capacity: u32) -> usize {
        if capacity <= self.capacity() || capacity <= INLINE_STORAGE_CAPACITY {
            return 0;
        }
        let current_external = if self.is_inline() { 0 } else { self.capacity() };
        (capacity - current_external) as usize * mem::size_of::<Value>()
    }

    /// Grows to at least `capacity` slots, preserving every value.
    ///
    /// The new slot vector is fully built before it replaces the old one, so
    /// a reference is always held by exactly one of them.
    pub fn grow_to(&mut self, capacity: u32) {
        if capacity <= self.capacity() {
            return;
        }
        let was_inline = self.is_inline();
        let mut slots: Vec<Value> = Vec::with_capacity(capacity as usize);
        slots.extend(self.slots_mut().iter_mut().map(mem::take));
        slots.resize(capacity as usize, Value::Undefined);
        *self = PropertyStorage::External(slots);
        if was_inline {
            tracing::debug!(capacity, "property storage moved out of line");
        }
    }

    /// Heap bytes held outside the object cell.
    pub fn heap_size(&self) -> usize {
        match self {
            PropertyStorage::Inline(_) => 0,
            PropertyStorage::External(slots) => slots.len() * mem::size_of::<Value>(),
        }
    }

    /// Iterates all slots.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.slots().iter()
    }
}

impl Trace for PropertyStorage {
    fn trace(&self, tracer: &mut Tracer) {
        for value in self.slots() {
            tracer.visit_value(value);
        }
    }
}
