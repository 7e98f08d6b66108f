//! The object protocol: get, put, delete, enumerate, define and the
//! integrity operations, built on structures and property tables.
//!
//! Every public entry point roots its receiver and any object-valued
//! arguments before doing work that may allocate.

mod define;
mod delete;
mod enumerate;
mod get;
mod integrity;
mod put;

use crate::error::{ObjectError, ObjectResult};
use crate::object::ObjectHooks;
use crate::property_table::PropertyEntry;
use crate::runtime::Runtime;
use core_types::{ObjectRef, PropertyKey};

/// Outcome of a rejected operation: a TypeError when `throw` is set,
/// otherwise a silent `false`.
pub(crate) fn reject(throw: bool, message: &str) -> ObjectResult<bool> {
    if throw {
        Err(ObjectError::type_error(message))
    } else {
        Ok(false)
    }
}

impl Runtime {
    /// Looks up `key` in `object`'s own table, materializing it if needed.
    pub(crate) fn own_entry(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
    ) -> ObjectResult<Option<PropertyEntry>> {
        let structure = self.object(object)?.structure;
        self.materialize_table(structure)?;
        Ok(self.structure(structure)?.find(key).copied())
    }

    /// The next object in `object`'s prototype chain.
    pub(crate) fn prototype_link(&self, object: ObjectRef) -> ObjectResult<Option<ObjectRef>> {
        let structure = self.object(object)?.structure;
        Ok(self.structure(structure)?.prototype.as_object())
    }

    /// Exotic hooks of `object`'s class.
    pub(crate) fn hooks_of(&self, object: ObjectRef) -> ObjectResult<Option<&'static dyn ObjectHooks>> {
        let structure = self.object(object)?.structure;
        Ok(self.structure(structure)?.class.hooks)
    }
}
