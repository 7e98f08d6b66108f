//! Object Model - shapes, property storage and the object protocol
//!
//! Objects do not carry their own property maps. Each object points at a
//! [`Structure`] describing the layout of its property slots, and objects
//! built by the same sequence of property additions share one structure.
//! Structures form a transition forest: adding a property follows (or
//! creates) an edge to a child structure, and property tables are built
//! lazily by replaying the edges from the nearest ancestor that has one.
//!
//! When a structure's lineage grows too long, or a property is removed,
//! the object switches to a private dictionary structure that is mutated
//! in place.
//!
//! # Overview
//!
//! - [`Runtime`] - owns the heap, the identifier pool and the collector
//! - [`Structure`] / [`TransitionTable`] - shapes and their transitions
//! - [`PropertyTable`] - key to slot/attributes mapping
//! - [`PropertyStorage`] - per-object slot vector
//! - [`PropertyDescriptor`] / [`PropertyDescriptorPatch`] - descriptor
//!   objects for `define_own_property` and friends
//!
//! # Examples
//!
//! ```
//! use core_types::Value;
//! use object_model::Runtime;
//!
//! let mut rt = Runtime::new();
//! let a = rt.create_object(None).unwrap();
//! let b = rt.create_object(None).unwrap();
//! let x = rt.intern("x");
//!
//! rt.put(a, x, Value::Smi(1), true).unwrap();
//! rt.put(b, x, Value::Smi(2), true).unwrap();
//!
//! assert_eq!(rt.structure_of(a).unwrap(), rt.structure_of(b).unwrap());
//! assert_eq!(rt.get(b, x).unwrap(), Value::Smi(2));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod attributes;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod object;
pub mod property_table;
mod protocol;
pub mod runtime;
pub mod storage;
pub mod structure;
mod transition;

pub use attributes::Attributes;
pub use config::RuntimeConfig;
pub use descriptor::{PropertyDescriptor, PropertyDescriptorPatch, PropertyKind};
pub use error::{ObjectError, ObjectResult};
pub use object::{
    AccessorPair, ClassInfo, JsObject, NativeFunction, ObjectData, ObjectHooks, ObjectKind,
    FUNCTION_CLASS, GETTER_SETTER_CLASS, OBJECT_CLASS,
};
pub use property_table::{PropertyEntry, PropertyTable};
pub use runtime::{RootCell, Runtime};
pub use storage::{
    capacity_for_offset, next_capacity, PropertyStorage, BASE_EXTERNAL_STORAGE_CAPACITY,
    INLINE_STORAGE_CAPACITY,
};
pub use structure::{
    DictionaryKind, Structure, StructureFlags, TransitionEdge, TransitionTable,
    MAX_SPECIFIC_FUNCTION_THRASH_COUNT, MAX_TRANSITION_LENGTH,
};
