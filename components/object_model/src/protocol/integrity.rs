use crate::attributes::Attributes;
use crate::error::ObjectResult;
use crate::runtime::Runtime;
use core_types::{ObjectRef, Value};
use memory_manager::CellRef;
use tracing::trace;

impl Runtime {
    /// Returns true if new properties may be added to `object`.
    pub fn is_extensible(&self, object: ObjectRef) -> ObjectResult<bool> {
        let structure = self.structure_of(object)?;
        Ok(self.structure(structure)?.is_extensible())
    }

    /// Forbids adding properties to `object`. Idempotent.
    pub fn prevent_extensions(&mut self, object: ObjectRef) -> ObjectResult<()> {
        if !self.is_extensible(object)? {
            return Ok(());
        }
        self.with_roots([CellRef::Object(object)], |rt| {
            let structure = rt.structure_of(object)?;
            let next = rt.prevent_extensions_transition(structure)?;
            rt.set_structure(object, next)
        })
    }

    /// Makes every own property non-configurable and forbids additions.
    pub fn seal(&mut self, object: ObjectRef) -> ObjectResult<()> {
        if self.is_sealed(object)? {
            return Ok(());
        }
        self.with_roots([CellRef::Object(object)], |rt| {
            rt.prevent_extensions(object)?;
            let structure = rt.structure_of(object)?;
            let next = rt.seal_transition(structure)?;
            trace!(?object, ?next, "sealed");
            rt.set_structure(object, next)
        })
    }

    /// Seals `object` and makes its data properties read-only.
    pub fn freeze(&mut self, object: ObjectRef) -> ObjectResult<()> {
        if self.is_frozen(object)? {
            return Ok(());
        }
        self.with_roots([CellRef::Object(object)], |rt| {
            rt.prevent_extensions(object)?;
            let structure = rt.structure_of(object)?;
            let next = rt.freeze_transition(structure)?;
            trace!(?object, ?next, "frozen");
            rt.set_structure(object, next)
        })
    }

    /// Returns true if `object` is non-extensible and no own property is
    /// configurable.
    pub fn is_sealed(&mut self, object: ObjectRef) -> ObjectResult<bool> {
        self.check_entries(object, |attributes| !attributes.is_configurable())
    }

    /// Returns true if `object` is sealed and no own data property is
    /// writable.
    pub fn is_frozen(&mut self, object: ObjectRef) -> ObjectResult<bool> {
        self.check_entries(object, |attributes| {
            !attributes.is_configurable() && (attributes.is_accessor() || attributes.is_read_only())
        })
    }

    fn check_entries(
        &mut self,
        object: ObjectRef,
        check: impl Fn(Attributes) -> bool,
    ) -> ObjectResult<bool> {
        if self.is_extensible(object)? {
            return Ok(false);
        }
        let structure = self.structure_of(object)?;
        self.materialize_table(structure)?;
        Ok(self
            .structure(structure)?
            .table()
            .map_or(true, |table| table.iter().all(|entry| check(entry.attributes))))
    }

    /// The prototype of `object`, or `None` for a null prototype.
    pub fn get_prototype_of(&self, object: ObjectRef) -> ObjectResult<Option<ObjectRef>> {
        self.prototype_link(object)
    }

    /// Replaces the prototype of `object`.
    ///
    /// Returns false, changing nothing, if `prototype` would make the chain
    /// cyclic.
    pub fn set_prototype_of(
        &mut self,
        object: ObjectRef,
        prototype: Option<ObjectRef>,
    ) -> ObjectResult<bool> {
        let mut current = prototype;
        while let Some(link) = current {
            if link == object {
                return Ok(false);
            }
            current = self.prototype_link(link)?;
        }
        if self.prototype_link(object)? == prototype {
            return Ok(true);
        }

        let roots = [Some(object), prototype].into_iter().flatten().map(CellRef::Object);
        self.with_roots(roots, |rt| {
            let structure = rt.structure_of(object)?;
            let value = prototype.map_or(Value::Null, Value::Object);
            let next = rt.change_prototype_transition(structure, value)?;
            rt.set_structure(object, next)
        })?;
        Ok(true)
    }
}
