//! Structure transitions.
//!
//! Every operation here takes a structure and a requested change and
//! returns the structure objects should switch to. Property additions are
//! memoized in the parent's transition table; every other change produces a
//! fresh root that owns a pinned copy of the table. Dictionary structures
//! belong to a single object and are mutated in place instead.
//!
//! Each operation reserves heap bytes before it detaches or copies a table,
//! so a collection triggered by the reservation never observes a half-built
//! structure.

use crate::attributes::Attributes;
use crate::error::ObjectResult;
use crate::property_table::PropertyTable;
use crate::runtime::{value_cell, Runtime};
use crate::storage::capacity_for_offset;
use crate::structure::{
    DictionaryKind, Structure, StructureFlags, TransitionEdge, TransitionTable,
};
use core_types::{JsError, ObjectRef, PropertyKey, StructureRef, Value};
use memory_manager::CellRef;
use tracing::{debug, trace};

impl Runtime {
    /// Ensures `structure` has a property table, rebuilding it from its
    /// ancestry if needed.
    ///
    /// The rebuilt table starts from a copy of the nearest ancestor's table
    /// (or an empty one at the forest root) and replays every edge between
    /// that ancestor and `structure` at its recorded offset.
    pub fn materialize_table(&mut self, structure: StructureRef) -> ObjectResult<()> {
        if self.structure(structure)?.table.is_some() {
            return Ok(());
        }

        let mut edges = Vec::new();
        let mut cursor = structure;
        let base = loop {
            let node = self.structure(cursor)?;
            if node.table.is_some() {
                break node.table.clone();
            }
            match (node.edge, node.previous) {
                (Some(edge), Some(previous)) => {
                    edges.push(edge);
                    cursor = previous;
                }
                _ => break None,
            }
        };

        let mut table = base.unwrap_or_default();
        for edge in edges.iter().rev() {
            table.add(edge.key, edge.offset, edge.attributes, edge.specific_value);
        }

        let bytes = table.memory_size();
        self.with_roots([CellRef::Structure(structure)], |rt| rt.reserve(bytes))?;
        let node = self.structure_mut(structure)?;
        node.table = Some(table);
        node.table_pinned = false;
        node.charged += bytes;
        trace!(?structure, replayed = edges.len(), "materialized property table");
        Ok(())
    }

    /// Returns the memoized child for an add, if its specific value matches.
    fn existing_transition(
        &self,
        structure: StructureRef,
        key: PropertyKey,
        attributes: Attributes,
        specific: Option<ObjectRef>,
    ) -> ObjectResult<Option<(StructureRef, u32)>> {
        let Some(child) = self.structure(structure)?.transitions.get(key, attributes) else {
            return Ok(None);
        };
        let edge = self
            .structure(child)?
            .edge
            .ok_or_else(|| JsError::internal("transition child without an edge"))?;
        Ok((edge.specific_value == specific).then_some((child, edge.offset)))
    }

    /// Adds `key` to `structure`, returning the resulting structure and the
    /// offset assigned to the key.
    ///
    /// Identical sequences of additions from the same root yield the same
    /// structure. A dictionary gains the key in place; a lineage whose chain
    /// grew too long is first converted to a cacheable dictionary.
    pub fn add_property_transition(
        &mut self,
        structure: StructureRef,
        key: PropertyKey,
        attributes: Attributes,
        specific: Option<ObjectRef>,
    ) -> ObjectResult<(StructureRef, u32)> {
        let roots = std::iter::once(CellRef::Structure(structure))
            .chain(specific.map(CellRef::Object));
        self.with_roots(roots, |rt| {
            rt.add_property_transition_inner(structure, key, attributes, specific)
        })
    }

    fn add_property_transition_inner(
        &mut self,
        structure: StructureRef,
        key: PropertyKey,
        attributes: Attributes,
        mut specific: Option<ObjectRef>,
    ) -> ObjectResult<(StructureRef, u32)> {
        if self.structure(structure)?.is_dictionary() {
            let offset = self.add_property_without_transition(structure, key, attributes, specific)?;
            return Ok((structure, offset));
        }

        if let Some(hit) = self.existing_transition(structure, key, attributes, specific)? {
            return Ok(hit);
        }

        let node = self.structure(structure)?;
        if specific.is_some() {
            let conflicting = node.transitions.get(key, attributes).is_some();
            if conflicting || node.thrash_count >= self.config().max_specific_function_thrash_count {
                specific = None;
                if let Some(hit) = self.existing_transition(structure, key, attributes, None)? {
                    trace!(?structure, key = key.id(), "reused unspecific transition");
                    return Ok(hit);
                }
            }
        }

        if self.structure(structure)?.transition_count > self.config().max_transition_length {
            let dictionary = self.to_cacheable_dictionary(structure)?;
            let offset = self.with_roots([CellRef::Structure(dictionary)], |rt| {
                rt.add_property_without_transition(dictionary, key, attributes, specific)
            })?;
            return Ok((dictionary, offset));
        }

        self.materialize_table(structure)?;
        let node = self.structure(structure)?;
        let table_bytes = node.table.as_ref().map_or(0, PropertyTable::memory_size);
        let move_table = !node.table_pinned;
        let cloned_bytes = if move_table { 0 } else { table_bytes };
        self.reserve(Structure::CELL_SIZE + cloned_bytes)?;

        let parent = self.structure_mut(structure)?;
        let table = if move_table {
            parent.charged = parent.charged.saturating_sub(table_bytes);
            parent.table.take()
        } else {
            parent.table.clone()
        };
        let mut table = table.unwrap_or_default();
        let offset = table.next_offset();
        table.add(key, offset, attributes, specific);

        let mut flags = parent.flags.difference(StructureFlags::DID_TRANSITION);
        if attributes.is_accessor() {
            flags |= StructureFlags::HAS_ACCESSORS;
        }
        if !attributes.is_enumerable() {
            flags |= StructureFlags::HAS_NON_ENUMERABLE;
        }
        let child = Structure {
            prototype: parent.prototype.clone(),
            class: parent.class,
            previous: Some(structure),
            table: Some(table),
            table_pinned: false,
            transitions: TransitionTable::Empty,
            edge: Some(TransitionEdge {
                key,
                attributes,
                specific_value: specific,
                offset,
            }),
            storage_capacity: capacity_for_offset(parent.storage_capacity, offset),
            dictionary_kind: DictionaryKind::None,
            flags,
            thrash_count: parent.thrash_count,
            transition_count: parent.transition_count + 1,
            charged: Structure::CELL_SIZE + table_bytes,
        };

        let child = StructureRef::from_index(self.structures.insert(child));
        let parent = self.structure_mut(structure)?;
        parent.transitions.insert(key, attributes, child);
        parent.flags |= StructureFlags::DID_TRANSITION;
        trace!(from = ?structure, to = ?child, key = key.id(), offset, "add property transition");
        Ok((child, offset))
    }

    /// The offset the next in-place addition to `structure` will use, and
    /// the storage capacity it will require.
    pub(crate) fn next_slot(&mut self, structure: StructureRef) -> ObjectResult<(u32, u32)> {
        self.materialize_table(structure)?;
        let node = self.structure(structure)?;
        let offset = node.table.as_ref().map_or(0, PropertyTable::peek_next_offset);
        Ok((offset, capacity_for_offset(node.storage_capacity, offset)))
    }

    /// Adds `key` to `structure`'s own table without creating a new node.
    ///
    /// Only valid on structures private to one object: dictionaries, or
    /// fresh roots a built-in is pre-shaping.
    pub fn add_property_without_transition(
        &mut self,
        structure: StructureRef,
        key: PropertyKey,
        attributes: Attributes,
        specific: Option<ObjectRef>,
    ) -> ObjectResult<u32> {
        self.materialize_table(structure)?;
        let growth = match self.structure(structure)?.table.as_ref() {
            Some(table) if table.contains(key) => {
                return Err(JsError::internal("property already present in structure").into());
            }
            Some(table) => table.growth_for_add(),
            None => {
                return Err(JsError::internal("structure table missing after materialization").into());
            }
        };
        self.with_roots([CellRef::Structure(structure)], |rt| rt.reserve(growth))?;

        let node = self.structure_mut(structure)?;
        node.charged += growth;
        let table = node
            .table
            .as_mut()
            .ok_or_else(|| JsError::internal("structure table missing after materialization"))?;
        let offset = table.next_offset();
        table.add(key, offset, attributes, specific);
        node.table_pinned = true;
        node.storage_capacity = capacity_for_offset(node.storage_capacity, offset);
        if attributes.is_accessor() {
            node.flags |= StructureFlags::HAS_ACCESSORS;
        }
        if !attributes.is_enumerable() {
            node.flags |= StructureFlags::HAS_NON_ENUMERABLE;
        }
        trace!(?structure, key = key.id(), offset, "added property in place");
        Ok(offset)
    }

    /// Removes `key`, returning the resulting dictionary structure and the
    /// freed offset (`None` if the key was absent).
    ///
    /// Anything but an uncacheable dictionary is first copied into one.
    pub fn remove_property_transition(
        &mut self,
        structure: StructureRef,
        key: PropertyKey,
    ) -> ObjectResult<(StructureRef, Option<u32>)> {
        let dictionary = match self.structure(structure)?.dictionary_kind {
            DictionaryKind::Uncacheable => structure,
            _ => self.to_uncacheable_dictionary(structure)?,
        };
        let offset = self.remove_property_without_transition(dictionary, key)?;
        Ok((dictionary, offset))
    }

    /// Removes `key` from `structure`'s own table in place.
    pub fn remove_property_without_transition(
        &mut self,
        structure: StructureRef,
        key: PropertyKey,
    ) -> ObjectResult<Option<u32>> {
        self.materialize_table(structure)?;
        let node = self.structure_mut(structure)?;
        let offset = node.table.as_mut().and_then(|table| table.remove(key));
        node.table_pinned = true;
        trace!(?structure, key = key.id(), ?offset, "removed property in place");
        Ok(offset)
    }

    /// Copies `structure` into a new root with a pinned table, then applies
    /// `mutate` to the copy.
    fn clone_transition(
        &mut self,
        structure: StructureRef,
        mutate: impl FnOnce(&mut Structure),
    ) -> ObjectResult<StructureRef> {
        self.with_roots([CellRef::Structure(structure)], |rt| {
            rt.materialize_table(structure)?;
            let table = rt.structure(structure)?.table.clone().unwrap_or_default();
            let bytes = Structure::CELL_SIZE + table.memory_size();
            rt.reserve(bytes)?;

            let mut copy = rt.structure(structure)?.detached_copy(table, bytes);
            mutate(&mut copy);
            let copy = StructureRef::from_index(rt.structures.insert(copy));
            trace!(from = ?structure, to = ?copy, "cloning transition");
            Ok(copy)
        })
    }

    fn to_dictionary(
        &mut self,
        structure: StructureRef,
        kind: DictionaryKind,
    ) -> ObjectResult<StructureRef> {
        let dictionary = self.clone_transition(structure, |s| s.dictionary_kind = kind)?;
        debug!(from = ?structure, to = ?dictionary, ?kind, "converted to dictionary");
        Ok(dictionary)
    }

    /// Private copy of `structure` in cacheable dictionary mode.
    pub fn to_cacheable_dictionary(&mut self, structure: StructureRef) -> ObjectResult<StructureRef> {
        self.to_dictionary(structure, DictionaryKind::Cacheable)
    }

    /// Private copy of `structure` in uncacheable dictionary mode.
    pub fn to_uncacheable_dictionary(
        &mut self,
        structure: StructureRef,
    ) -> ObjectResult<StructureRef> {
        self.to_dictionary(structure, DictionaryKind::Uncacheable)
    }

    /// New structure identical to `structure` but with another prototype.
    pub fn change_prototype_transition(
        &mut self,
        structure: StructureRef,
        prototype: Value,
    ) -> ObjectResult<StructureRef> {
        let roots = value_cell(&prototype);
        self.with_roots(roots, |rt| {
            rt.clone_transition(structure, |s| s.prototype = prototype)
        })
    }

    /// New structure with the accessor flag set.
    pub fn add_getter_setter_flag(&mut self, structure: StructureRef) -> ObjectResult<StructureRef> {
        self.clone_transition(structure, |s| s.flags |= StructureFlags::HAS_ACCESSORS)
    }

    /// New structure in which `key` no longer records a specific value.
    ///
    /// Bumps the lineage's thrash count; once it reaches the configured
    /// bound every entry loses its specific value.
    pub fn despecify_function_transition(
        &mut self,
        structure: StructureRef,
        key: PropertyKey,
    ) -> ObjectResult<StructureRef> {
        let limit = self.config().max_specific_function_thrash_count;
        let despecified = self.clone_transition(structure, |s| {
            s.thrash_count = s.thrash_count.saturating_add(1);
            if let Some(table) = s.table.as_mut() {
                if s.thrash_count >= limit {
                    for entry in table.iter_mut() {
                        entry.specific_value = None;
                    }
                } else if let Some(entry) = table.find_mut(key) {
                    entry.specific_value = None;
                }
            }
        })?;
        debug!(
            from = ?structure,
            to = ?despecified,
            key = key.id(),
            thrash_count = self.structure(despecified)?.thrash_count,
            "despecified function property"
        );
        Ok(despecified)
    }

    /// Clears the specific value of `key` in a dictionary, in place.
    pub fn despecify_dictionary_function(
        &mut self,
        structure: StructureRef,
        key: PropertyKey,
    ) -> ObjectResult<()> {
        self.materialize_table(structure)?;
        let node = self.structure_mut(structure)?;
        if let Some(entry) = node.table.as_mut().and_then(|table| table.find_mut(key)) {
            entry.specific_value = None;
        }
        debug!(?structure, key = key.id(), "despecified dictionary property");
        Ok(())
    }

    /// New structure in which every entry is non-configurable and no
    /// properties may be added.
    pub fn seal_transition(&mut self, structure: StructureRef) -> ObjectResult<StructureRef> {
        self.clone_transition(structure, |s| {
            if let Some(table) = s.table.as_mut() {
                for entry in table.iter_mut() {
                    entry.attributes |= Attributes::NON_CONFIGURABLE;
                }
            }
            s.flags.remove(StructureFlags::EXTENSIBLE);
        })
    }

    /// Like [`seal_transition`](Self::seal_transition), and data entries
    /// also become read-only.
    pub fn freeze_transition(&mut self, structure: StructureRef) -> ObjectResult<StructureRef> {
        self.clone_transition(structure, |s| {
            if let Some(table) = s.table.as_mut() {
                for entry in table.iter_mut() {
                    entry.attributes |= Attributes::NON_CONFIGURABLE;
                    if !entry.attributes.is_accessor() {
                        entry.attributes |= Attributes::READ_ONLY;
                    }
                }
            }
            s.flags.remove(StructureFlags::EXTENSIBLE);
        })
    }

    /// New structure that refuses property additions.
    pub fn prevent_extensions_transition(
        &mut self,
        structure: StructureRef,
    ) -> ObjectResult<StructureRef> {
        self.clone_transition(structure, |s| s.flags.remove(StructureFlags::EXTENSIBLE))
    }
}
