//! Structures (shapes).
//!
//! A [`Structure`] describes the layout shared by every object pointing at
//! it: prototype, property table and mode flags. Structures form a forest
//! through their `previous` links; the transition table on each node
//! memoizes property additions so that objects built by the same sequence of
//! additions end up sharing one node.
//!
//! Only some nodes keep their property table. The others rebuild it on demand
//! by replaying the [`TransitionEdge`]s between them and the nearest ancestor
//! that has one (see `Runtime::materialize_table`).

use crate::attributes::Attributes;
use crate::object::ClassInfo;
use crate::property_table::{PropertyEntry, PropertyTable};
use crate::storage::INLINE_STORAGE_CAPACITY;
use core_types::{ObjectRef, PropertyKey, StructureRef, Value};
use memory_manager::{Trace, Tracer};
use rustc_hash::FxHashMap;
use std::mem;

/// Default chain length after which additions switch to a dictionary.
pub const MAX_TRANSITION_LENGTH: u32 = 64;

/// Default number of despecializations after which a lineage stops
/// recording specific values.
pub const MAX_SPECIFIC_FUNCTION_THRASH_COUNT: u8 = 3;

/// Dictionary mode of a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DictionaryKind {
    /// Shared, transition-tree structure
    #[default]
    None,
    /// Private to one object; lookups may still be cached
    Cacheable,
    /// Private to one object; properties were removed
    Uncacheable,
}

bitflags::bitflags! {
    /// Mode flags of a structure.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StructureFlags: u8 {
        /// Some entry in this structure or its ancestry is an accessor
        const HAS_ACCESSORS = 1 << 0;
        /// Some entry is non-enumerable
        const HAS_NON_ENUMERABLE = 1 << 1;
        /// New properties may be added
        const EXTENSIBLE = 1 << 2;
        /// At least one child was created from this node
        const DID_TRANSITION = 1 << 3;
    }
}

/// The change that produced a structure from its `previous`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEdge {
    /// Added key
    pub key: PropertyKey,
    /// Attributes of the added entry
    pub attributes: Attributes,
    /// Specific value of the added entry
    pub specific_value: Option<ObjectRef>,
    /// Offset assigned to the added entry
    pub offset: u32,
}

/// Outgoing add-property edges of a structure.
///
/// Most structures have at most one child, which is stored inline.
#[derive(Debug, Clone, Default)]
pub enum TransitionTable {
    /// No children yet
    #[default]
    Empty,
    /// Exactly one child
    Single {
        /// Edge key
        key: PropertyKey,
        /// Edge attributes
        attributes: Attributes,
        /// The child
        child: StructureRef,
    },
    /// Two or more children
    Map(FxHashMap<(PropertyKey, Attributes), StructureRef>),
}

impl TransitionTable {
    /// Looks up the child for an edge.
    pub fn get(&self, key: PropertyKey, attributes: Attributes) -> Option<StructureRef> {
        match self {
            TransitionTable::Empty => None,
            TransitionTable::Single {
                key: k,
                attributes: a,
                child,
            } => (*k == key && *a == attributes).then_some(*child),
            TransitionTable::Map(map) => map.get(&(key, attributes)).copied(),
        }
    }

    /// Registers `child` for an edge, replacing any previous child.
    pub fn insert(&mut self, key: PropertyKey, attributes: Attributes, child: StructureRef) {
        match self {
            TransitionTable::Empty => {
                *self = TransitionTable::Single {
                    key,
                    attributes,
                    child,
                };
            }
            TransitionTable::Single {
                key: k,
                attributes: a,
                child: c,
            } => {
                if *k == key && *a == attributes {
                    *c = child;
                    return;
                }
                let mut map = FxHashMap::default();
                map.insert((*k, *a), *c);
                map.insert((key, attributes), child);
                *self = TransitionTable::Map(map);
            }
            TransitionTable::Map(map) => {
                map.insert((key, attributes), child);
            }
        }
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        match self {
            TransitionTable::Empty => 0,
            TransitionTable::Single { .. } => 1,
            TransitionTable::Map(map) => map.len(),
        }
    }

    /// Returns true if there are no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates all children.
    pub fn children(&self) -> Box<dyn Iterator<Item = StructureRef> + '_> {
        match self {
            TransitionTable::Empty => Box::new(std::iter::empty()),
            TransitionTable::Single { child, .. } => Box::new(std::iter::once(*child)),
            TransitionTable::Map(map) => Box::new(map.values().copied()),
        }
    }
}

/// Layout description shared by objects.
///
/// Fields are mutated only by the runtime's transition operations; outside
/// the crate a structure is read-only.
#[derive(Debug)]
pub struct Structure {
    pub(crate) prototype: Value,
    pub(crate) class: &'static ClassInfo,
    pub(crate) previous: Option<StructureRef>,
    pub(crate) table: Option<PropertyTable>,
    /// A pinned table is owned by this node and is copied, never moved, when
    /// a child needs it.
    pub(crate) table_pinned: bool,
    pub(crate) transitions: TransitionTable,
    pub(crate) edge: Option<TransitionEdge>,
    pub(crate) storage_capacity: u32,
    pub(crate) dictionary_kind: DictionaryKind,
    pub(crate) flags: StructureFlags,
    pub(crate) thrash_count: u8,
    /// Add-property transitions since the nearest root or dictionary.
    pub(crate) transition_count: u32,
    /// Bytes charged to the allocator for this cell.
    pub(crate) charged: usize,
}

impl Structure {
    /// Approximate size of a structure cell without its table.
    pub const CELL_SIZE: usize = mem::size_of::<Structure>();

    /// Creates an empty forest root.
    pub(crate) fn root(prototype: Value, class: &'static ClassInfo) -> Self {
        Structure {
            prototype,
            class,
            previous: None,
            table: None,
            table_pinned: false,
            transitions: TransitionTable::Empty,
            edge: None,
            storage_capacity: INLINE_STORAGE_CAPACITY,
            dictionary_kind: DictionaryKind::None,
            flags: StructureFlags::EXTENSIBLE,
            thrash_count: 0,
            transition_count: 0,
            charged: Self::CELL_SIZE,
        }
    }

    /// Creates a new root carrying a pinned copy of `table` and this node's
    /// prototype, class, mode and capacity.
    pub(crate) fn detached_copy(&self, table: PropertyTable, charged: usize) -> Self {
        Structure {
            prototype: self.prototype.clone(),
            class: self.class,
            previous: None,
            table: Some(table),
            table_pinned: true,
            transitions: TransitionTable::Empty,
            edge: None,
            storage_capacity: self.storage_capacity,
            dictionary_kind: self.dictionary_kind,
            flags: self.flags.difference(StructureFlags::DID_TRANSITION),
            thrash_count: self.thrash_count,
            transition_count: 0,
            charged,
        }
    }

    /// The prototype shared by objects with this structure.
    pub fn prototype(&self) -> &Value {
        &self.prototype
    }

    /// The class descriptor of objects with this structure.
    pub fn class(&self) -> &'static ClassInfo {
        self.class
    }

    /// The structure this one transitioned from.
    pub fn previous(&self) -> Option<StructureRef> {
        self.previous
    }

    /// The edge that produced this structure.
    pub fn edge(&self) -> Option<&TransitionEdge> {
        self.edge.as_ref()
    }

    /// Outgoing add-property transitions.
    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// The property table, if currently materialized.
    pub fn table(&self) -> Option<&PropertyTable> {
        self.table.as_ref()
    }

    /// Returns true if the table is owned by this node.
    pub fn is_table_pinned(&self) -> bool {
        self.table.is_some() && self.table_pinned
    }

    /// Storage slots objects with this structure must provide.
    pub fn storage_capacity(&self) -> u32 {
        self.storage_capacity
    }

    /// Dictionary mode.
    pub fn dictionary_kind(&self) -> DictionaryKind {
        self.dictionary_kind
    }

    /// Returns true for either dictionary mode.
    pub fn is_dictionary(&self) -> bool {
        self.dictionary_kind != DictionaryKind::None
    }

    /// Mode flags.
    pub fn flags(&self) -> StructureFlags {
        self.flags
    }

    /// Returns true if new properties may be added.
    pub fn is_extensible(&self) -> bool {
        self.flags.contains(StructureFlags::EXTENSIBLE)
    }

    /// Returns true if an accessor may be present.
    pub fn has_accessors(&self) -> bool {
        self.flags.contains(StructureFlags::HAS_ACCESSORS)
    }

    /// Despecialization counter.
    pub fn thrash_count(&self) -> u8 {
        self.thrash_count
    }

    /// Add-property transitions since the nearest root or dictionary.
    pub fn transition_count(&self) -> u32 {
        self.transition_count
    }

    /// Looks up `key` in the materialized table.
    pub(crate) fn find(&self, key: PropertyKey) -> Option<&PropertyEntry> {
        self.table.as_ref().and_then(|table| table.find(key))
    }
}

impl Trace for Structure {
    fn trace(&self, tracer: &mut Tracer) {
        tracer.visit_value(&self.prototype);
        if let Some(previous) = self.previous {
            tracer.visit_structure(previous);
        }
        for child in self.transitions.children() {
            tracer.visit_structure(child);
        }
        if let Some(specific) = self.edge.and_then(|edge| edge.specific_value) {
            tracer.visit_object(specific);
        }
        self.table.trace(tracer);
    }
}
