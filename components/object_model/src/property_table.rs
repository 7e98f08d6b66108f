//! Open-addressed property table.
//!
//! Maps interned keys to their storage offset, attributes and optional
//! specific value. Entries live in a dense vector in insertion order, which is
//! the enumeration order; an index array probed linearly by the key's
//! precomputed hash points into it. Removal leaves a tombstone in both arrays
//! and pushes the freed offset onto a free list, the only source of offset
//! reuse.

use crate::attributes::Attributes;
use core_types::{ObjectRef, PropertyKey};
use memory_manager::{Trace, Tracer};
use std::mem;

const EMPTY: u32 = 0;
const DELETED: u32 = u32::MAX;
const MIN_INDEX_SIZE: usize = 16;

/// One row of a [`PropertyTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyEntry {
    /// The property name
    pub key: PropertyKey,
    /// Slot in the owning object's storage
    pub offset: u32,
    /// Attribute bits
    pub attributes: Attributes,
    /// The single function this slot has held so far, if any
    pub specific_value: Option<ObjectRef>,
}

/// Hash table from property key to [`PropertyEntry`].
///
/// # Example
///
/// ```
/// use core_types::IdentifierPool;
/// use object_model::{Attributes, PropertyTable};
///
/// let mut pool = IdentifierPool::new();
/// let (a, b) = (pool.intern("a"), pool.intern("b"));
///
/// let mut table = PropertyTable::new();
/// table.add(a, 0, Attributes::empty(), None);
/// table.add(b, 1, Attributes::empty(), None);
/// assert_eq!(table.remove(a), Some(0));
/// assert_eq!(table.next_offset(), 0);
/// assert_eq!(table.find(b).map(|e| e.offset), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct PropertyTable {
    /// Probe array; `EMPTY`, `DELETED` or an entry position plus one.
    index: Vec<u32>,
    /// Entries in insertion order; `None` marks a removed entry.
    entries: Vec<Option<PropertyEntry>>,
    key_count: usize,
    deleted_slots: usize,
    deleted_offsets: Vec<u32>,
}

impl PropertyTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        PropertyTable {
            index: vec![EMPTY; MIN_INDEX_SIZE],
            entries: Vec::new(),
            key_count: 0,
            deleted_slots: 0,
            deleted_offsets: Vec::new(),
        }
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.key_count
    }

    /// Returns true if there are no live keys.
    pub fn is_empty(&self) -> bool {
        self.key_count == 0
    }

    /// Number of storage slots the table accounts for: live offsets plus
    /// freed ones awaiting reuse.
    pub fn storage_size(&self) -> u32 {
        (self.key_count + self.deleted_offsets.len()) as u32
    }

    /// Offsets currently on the free list, most recently freed last.
    pub fn deleted_offsets(&self) -> &[u32] {
        &self.deleted_offsets
    }

    /// Returns the offset the next [`add`](Self::add) should use without
    /// claiming it.
    pub fn peek_next_offset(&self) -> u32 {
        self.deleted_offsets
            .last()
            .copied()
            .unwrap_or_else(|| self.storage_size())
    }

    /// Claims an offset for a new entry: the most recently freed one if any,
    /// otherwise the next unused slot.
    pub fn next_offset(&mut self) -> u32 {
        match self.deleted_offsets.pop() {
            Some(offset) => offset,
            None => self.storage_size(),
        }
    }

    fn mask(&self) -> usize {
        self.index.len() - 1
    }

    /// Returns the probe slot holding `key`, if present.
    fn probe(&self, key: PropertyKey) -> Option<usize> {
        let mask = self.mask();
        let mut slot = key.hash_value() as usize & mask;
        loop {
            match self.index[slot] {
                EMPTY => return None,
                DELETED => {}
                position => {
                    if let Some(entry) = &self.entries[(position - 1) as usize] {
                        if entry.key == key {
                            return Some(slot);
                        }
                    }
                }
            }
            slot = (slot + 1) & mask;
        }
    }

    /// Looks up `key`.
    pub fn find(&self, key: PropertyKey) -> Option<&PropertyEntry> {
        let slot = self.probe(key)?;
        self.entries[(self.index[slot] - 1) as usize].as_ref()
    }

    /// Looks up `key` for in-place modification of attributes or specific
    /// value.
    pub fn find_mut(&mut self, key: PropertyKey) -> Option<&mut PropertyEntry> {
        let slot = self.probe(key)?;
        self.entries[(self.index[slot] - 1) as usize].as_mut()
    }

    /// Returns true if `key` is present.
    pub fn contains(&self, key: PropertyKey) -> bool {
        self.probe(key).is_some()
    }

    /// Inserts a new entry at an explicit offset.
    ///
    /// Returns false, leaving the table untouched, if `key` already exists.
    /// Callers obtain `offset` from [`next_offset`](Self::next_offset) or from
    /// a recorded transition.
    pub fn add(
        &mut self,
        key: PropertyKey,
        offset: u32,
        attributes: Attributes,
        specific_value: Option<ObjectRef>,
    ) -> bool {
        if self.contains(key) {
            return false;
        }
        if self.needs_rehash() {
            self.rehash();
        }

        self.entries.push(Some(PropertyEntry {
            key,
            offset,
            attributes,
            specific_value,
        }));
        let position = self.entries.len() as u32;

        let mask = self.mask();
        let mut slot = key.hash_value() as usize & mask;
        while self.index[slot] != EMPTY && self.index[slot] != DELETED {
            slot = (slot + 1) & mask;
        }
        if self.index[slot] == DELETED {
            self.deleted_slots -= 1;
        }
        self.index[slot] = position;
        self.key_count += 1;
        true
    }

    /// Removes `key`, returning its offset. The offset goes onto the free
    /// list.
    pub fn remove(&mut self, key: PropertyKey) -> Option<u32> {
        let slot = self.probe(key)?;
        let position = (self.index[slot] - 1) as usize;
        let entry = self.entries[position].take()?;
        self.index[slot] = DELETED;
        self.deleted_slots += 1;
        self.key_count -= 1;
        self.deleted_offsets.push(entry.offset);
        Some(entry.offset)
    }

    fn needs_rehash(&self) -> bool {
        (self.key_count + self.deleted_slots + 1) * 2 >= self.index.len()
    }

    fn rehashed_index_size(&self) -> usize {
        let mut size = MIN_INDEX_SIZE;
        while size < (self.key_count + 1) * 4 {
            size *= 2;
        }
        size
    }

    /// Rebuilds the probe array, dropping tombstones. Offsets are untouched.
    fn rehash(&mut self) {
        let size = self.rehashed_index_size();

        let old_entries = mem::take(&mut self.entries);
        self.entries = old_entries.into_iter().flatten().map(Some).collect();
        self.index = vec![EMPTY; size];
        self.deleted_slots = 0;

        let mask = size - 1;
        for (position, entry) in self.entries.iter().enumerate() {
            if let Some(entry) = entry {
                let mut slot = entry.key.hash_value() as usize & mask;
                while self.index[slot] != EMPTY {
                    slot = (slot + 1) & mask;
                }
                self.index[slot] = position as u32 + 1;
            }
        }
    }

    /// Iterates live entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyEntry> {
        self.entries.iter().flatten()
    }

    /// Iterates live entries mutably in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PropertyEntry> {
        self.entries.iter_mut().flatten()
    }

    /// Deep copy, used when a table must be detached from a shared owner.
    pub fn copy(&self) -> PropertyTable {
        self.clone()
    }

    /// Bytes by which one more [`add`](Self::add) grows
    /// [`memory_size`](Self::memory_size). Never negative.
    pub fn growth_for_add(&self) -> usize {
        let entry = mem::size_of::<Option<PropertyEntry>>();
        if !self.needs_rehash() {
            return entry;
        }
        let index = self.rehashed_index_size() * mem::size_of::<u32>();
        let entries = (self.key_count + 1) * entry;
        let current = self.index.len() * mem::size_of::<u32>() + self.entries.len() * entry;
        (index + entries).saturating_sub(current)
    }

    /// Approximate heap footprint in bytes.
    pub fn memory_size(&self) -> usize {
        mem::size_of::<Self>()
            + self.index.len() * mem::size_of::<u32>()
            + self.entries.len() * mem::size_of::<Option<PropertyEntry>>()
            + self.deleted_offsets.len() * mem::size_of::<u32>()
    }
}

impl Default for PropertyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Trace for PropertyTable {
    fn trace(&self, tracer: &mut Tracer) {
        for entry in self.iter() {
            if let Some(specific) = entry.specific_value {
                tracer.visit_object(specific);
            }
        }
    }
}
