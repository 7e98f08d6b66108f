use super::reject;
use crate::attributes::Attributes;
use crate::descriptor::PropertyKind;
use crate::error::{ObjectError, ObjectResult};
use crate::object::AccessorPair;
use crate::runtime::{value_cell, Runtime};
use crate::structure::StructureFlags;
use core_types::{ObjectRef, PropertyKey, Value};
use memory_manager::CellRef;

const READ_ONLY_WRITE_ERROR: &str = "Attempted to assign to readonly property.";
const GETTER_ONLY_WRITE_ERROR: &str = "setting a property that has only a getter";

/// How a direct store treats existing entries and extensibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PutMode {
    /// Assignment: honors read-only entries and extensibility
    Put,
    /// Definition: installs the given attributes unconditionally
    Define,
}

impl Runtime {
    /// `[[Set]]`: assigns `value` to `key` on `object`.
    ///
    /// Returns `Ok(false)` when the assignment was silently ignored. In
    /// strict mode, writes to read-only properties, to accessors without a
    /// setter and to new keys of non-extensible objects fail with a
    /// TypeError instead. Assigning a cyclic `__proto__` always fails.
    pub fn put(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
        value: Value,
        strict: bool,
    ) -> ObjectResult<bool> {
        let roots = std::iter::once(CellRef::Object(object)).chain(value_cell(&value));
        self.with_roots(roots, |rt| rt.put_inner(object, key, value, strict))
    }

    fn put_inner(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
        value: Value,
        strict: bool,
    ) -> ObjectResult<bool> {
        if key == self.proto_key {
            if !value.is_object() && !value.is_null() {
                return Ok(false);
            }
            if !self.set_prototype_of(object, value.as_object())? {
                return Err(ObjectError::type_error("cyclic __proto__ value"));
            }
            return Ok(true);
        }

        if !self.chain_needs_lookup(object)? {
            return self.put_checked(object, key, value, strict);
        }

        let mut current = Some(object);
        while let Some(link) = current {
            if let Some(hooks) = self.hooks_of(link)? {
                if let Some(descriptor) = hooks.get_own_property(self, link, key) {
                    return match descriptor.kind {
                        PropertyKind::Accessor { set: Some(setter), .. } => {
                            self.call(setter, Value::Object(object), &[value])?;
                            Ok(true)
                        }
                        PropertyKind::Accessor { set: None, .. } => {
                            reject(strict, GETTER_ONLY_WRITE_ERROR)
                        }
                        // Synthesized data has no slot to write through.
                        PropertyKind::Data { writable, .. } if link == object || !writable => {
                            reject(strict, READ_ONLY_WRITE_ERROR)
                        }
                        PropertyKind::Data { .. } => self.put_checked(object, key, value, strict),
                    };
                }
            }
            if let Some(entry) = self.own_entry(link, key)? {
                if entry.attributes.is_accessor() {
                    let slot = self.read_slot(link, entry.offset)?;
                    let (_, pair) = self.accessor_pair(&slot)?;
                    return match pair.setter {
                        Some(setter) => {
                            self.call(setter, Value::Object(object), &[value])?;
                            Ok(true)
                        }
                        None => reject(strict, GETTER_ONLY_WRITE_ERROR),
                    };
                }
                // A data property on a prototype is shadowed by a new own one.
                break;
            }
            current = self.prototype_link(link)?;
        }
        self.put_checked(object, key, value, strict)
    }

    fn put_checked(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
        value: Value,
        strict: bool,
    ) -> ObjectResult<bool> {
        if self.put_direct_internal(object, key, value, Attributes::empty(), PutMode::Put)? {
            Ok(true)
        } else {
            reject(strict, READ_ONLY_WRITE_ERROR)
        }
    }

    /// Returns true if some link has accessors or exotic hooks, so the
    /// chain must be walked before storing.
    fn chain_needs_lookup(&self, object: ObjectRef) -> ObjectResult<bool> {
        let mut current = Some(object);
        while let Some(link) = current {
            let structure = self.structure_of(link)?;
            let node = self.structure(structure)?;
            if node.has_accessors() || node.class.hooks.is_some() {
                return Ok(true);
            }
            current = node.prototype.as_object();
        }
        Ok(false)
    }

    /// Stores `value` as an own data property with `attributes`, skipping
    /// the prototype chain and read-only checks.
    ///
    /// Built-ins use this to install properties on fresh instances.
    pub fn put_direct(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
        value: Value,
        attributes: Attributes,
    ) -> ObjectResult<()> {
        let roots = std::iter::once(CellRef::Object(object)).chain(value_cell(&value));
        self.with_roots(roots, |rt| {
            rt.put_direct_internal(object, key, value, attributes.without_accessor(), PutMode::Define)
        })?;
        Ok(())
    }

    /// Installs an accessor property backed by `pair`.
    pub fn put_direct_accessor(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
        pair: AccessorPair,
        attributes: Attributes,
    ) -> ObjectResult<()> {
        let roots = [Some(object), pair.getter, pair.setter]
            .into_iter()
            .flatten()
            .map(CellRef::Object);
        self.with_roots(roots, |rt| {
            let cell = rt.create_getter_setter(pair)?;
            rt.push_root(CellRef::Object(cell));
            rt.put_accessor_cell(object, key, cell, pair, attributes)
        })
    }

    /// Stores an existing getter/setter cell as the accessor `key`.
    pub(crate) fn put_accessor_cell(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
        cell: ObjectRef,
        pair: AccessorPair,
        attributes: Attributes,
    ) -> ObjectResult<()> {
        let attributes = attributes.without_accessor().difference(Attributes::READ_ONLY)
            | Attributes::accessor(pair.getter.is_some(), pair.setter.is_some());
        self.put_direct_internal(object, key, Value::Object(cell), attributes, PutMode::Define)?;
        self.ensure_has_accessors(object)
    }

    /// Makes sure `object`'s structure carries the accessor flag.
    fn ensure_has_accessors(&mut self, object: ObjectRef) -> ObjectResult<()> {
        let structure = self.structure_of(object)?;
        let node = self.structure(structure)?;
        if node.has_accessors() {
            return Ok(());
        }
        let edge_is_accessor = node.edge.is_some_and(|edge| edge.attributes.is_accessor());
        if node.is_dictionary() || edge_is_accessor {
            self.structure_mut(structure)?.flags |= StructureFlags::HAS_ACCESSORS;
            return Ok(());
        }
        let flagged = self.add_getter_setter_flag(structure)?;
        self.set_structure(object, flagged)
    }

    /// Core own-property store shared by assignment and definition.
    ///
    /// Returns `Ok(false)` without mutating anything when `mode` is
    /// [`PutMode::Put`] and the key is read-only, or new on a non-extensible
    /// object. Callers root `object` and `value`.
    pub(crate) fn put_direct_internal(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
        value: Value,
        attributes: Attributes,
        mode: PutMode,
    ) -> ObjectResult<bool> {
        let specific = self.callable(&value);

        if let Some(entry) = self.own_entry(object, key)? {
            if mode == PutMode::Put && entry.attributes.is_read_only() {
                return Ok(false);
            }
            if mode == PutMode::Define && entry.attributes != attributes {
                self.remove_own_property(object, key)?;
                self.add_own_property(object, key, value, attributes, specific)?;
                return Ok(true);
            }
            if let Some(current) = entry.specific_value {
                if specific != Some(current) {
                    self.despecify(object, key)?;
                }
            }
            self.write_slot(object, entry.offset, value)?;
            return Ok(true);
        }

        let structure = self.structure_of(object)?;
        if mode == PutMode::Put && !self.structure(structure)?.is_extensible() {
            return Ok(false);
        }
        self.add_own_property(object, key, value, attributes, specific)?;
        Ok(true)
    }

    /// Clears the specific value recorded for `key` on `object`.
    fn despecify(&mut self, object: ObjectRef, key: PropertyKey) -> ObjectResult<()> {
        let structure = self.structure_of(object)?;
        if self.structure(structure)?.is_dictionary() {
            return self.despecify_dictionary_function(structure, key);
        }
        let despecified = self.despecify_function_transition(structure, key)?;
        self.set_structure(object, despecified)
    }

    /// Adds a new own property and writes its slot.
    ///
    /// Storage is grown before the object's structure changes, so running
    /// out of memory leaves the object as it was.
    pub(crate) fn add_own_property(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
        value: Value,
        attributes: Attributes,
        specific: Option<ObjectRef>,
    ) -> ObjectResult<u32> {
        let structure = self.structure_of(object)?;

        if self.structure(structure)?.is_dictionary() {
            let (_, capacity) = self.next_slot(structure)?;
            self.grow_storage(object, capacity)?;
            let offset = self.add_property_without_transition(structure, key, attributes, specific)?;
            self.write_slot(object, offset, value)?;
            return Ok(offset);
        }

        let (next, offset) = self.add_property_transition(structure, key, attributes, specific)?;
        self.with_roots([CellRef::Structure(next)], |rt| {
            let capacity = rt.structure(next)?.storage_capacity;
            rt.grow_storage(object, capacity)?;
            rt.set_structure(object, next)?;
            rt.write_slot(object, offset, value)?;
            Ok(offset)
        })
    }

    /// Removes an own property regardless of its attributes and clears its
    /// slot.
    pub(crate) fn remove_own_property(&mut self, object: ObjectRef, key: PropertyKey) -> ObjectResult<()> {
        let structure = self.structure_of(object)?;
        let (next, offset) = self.remove_property_transition(structure, key)?;
        let cell = self.object_mut(object)?;
        cell.structure = next;
        if let Some(offset) = offset {
            cell.storage.clear(offset);
        }
        Ok(())
    }
}
