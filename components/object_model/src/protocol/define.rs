use super::put::PutMode;
use super::reject;
use crate::attributes::Attributes;
use crate::descriptor::{PropertyDescriptor, PropertyDescriptorPatch, PropertyKind};
use crate::error::ObjectResult;
use crate::object::AccessorPair;
use crate::runtime::{value_cell, Runtime};
use core_types::{JsError, ObjectRef, PropertyKey, Value};
use memory_manager::CellRef;

impl Runtime {
    /// `[[GetOwnProperty]]`: the descriptor of `object`'s own `key`.
    pub fn get_own_property_descriptor(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
    ) -> ObjectResult<Option<PropertyDescriptor>> {
        if let Some(hooks) = self.hooks_of(object)? {
            if let Some(descriptor) = hooks.get_own_property(self, object, key) {
                return Ok(Some(descriptor));
            }
        }
        let Some(entry) = self.own_entry(object, key)? else {
            return Ok(None);
        };
        let value = self.read_slot(object, entry.offset)?;
        let kind = if entry.attributes.is_accessor() {
            let (_, pair) = self.accessor_pair(&value)?;
            PropertyKind::Accessor {
                get: pair.getter,
                set: pair.setter,
            }
        } else {
            PropertyKind::Data {
                value,
                writable: true,
            }
        };
        Ok(Some(PropertyDescriptor::from_parts(entry.attributes, kind)))
    }

    /// The descriptor of `key` on `object` or the nearest prototype that
    /// has it.
    pub fn get_property_descriptor(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
    ) -> ObjectResult<Option<PropertyDescriptor>> {
        self.with_roots([CellRef::Object(object)], |rt| {
            let mut current = Some(object);
            while let Some(link) = current {
                if let Some(descriptor) = rt.get_own_property_descriptor(link, key)? {
                    return Ok(Some(descriptor));
                }
                current = rt.prototype_link(link)?;
            }
            Ok(None)
        })
    }

    /// `[[DefineOwnProperty]]`: creates or reconfigures the own property
    /// `key` according to `patch`.
    ///
    /// Returns `Ok(false)`, or a TypeError when `throw` is set, if the
    /// change is not allowed; nothing is mutated in that case. A malformed
    /// patch is always a TypeError.
    pub fn define_own_property(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
        patch: &PropertyDescriptorPatch,
        throw: bool,
    ) -> ObjectResult<bool> {
        patch.validate()?;
        let roots = std::iter::once(CellRef::Object(object))
            .chain([&patch.value, &patch.get, &patch.set].into_iter().flatten().filter_map(value_cell));
        self.with_roots(roots, |rt| rt.define_inner(object, key, patch, throw))
    }

    fn define_inner(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
        patch: &PropertyDescriptorPatch,
        throw: bool,
    ) -> ObjectResult<bool> {
        let Some(current) = self.get_own_property_descriptor(object, key)? else {
            if !self.is_extensible(object)? {
                return reject(throw, "Attempting to define property on object that is not extensible.");
            }
            self.put_descriptor(object, key, patch, patch.attributes(), None)?;
            return Ok(true);
        };

        if patch.is_empty() || patch.equal_to(&current) {
            return Ok(true);
        }

        if !current.configurable {
            if patch.configurable == Some(true) {
                return reject(throw, "Attempting to configurable attribute of unconfigurable property.");
            }
            if patch.enumerable.is_some_and(|e| e != current.enumerable) {
                return reject(throw, "Attempting to change enumerable attribute of unconfigurable property.");
            }
        }

        let attributes = patch.attributes_overriding(Some(&current));

        if patch.is_generic() {
            if !patch.attributes_equal(&current) {
                self.redefine(object, key, patch, attributes, &current)?;
            }
            return Ok(true);
        }

        if patch.is_data() == current.is_accessor() {
            if !current.configurable {
                return reject(throw, "Attempting to change access mechanism for an unconfigurable property.");
            }
            self.redefine(object, key, patch, attributes, &current)?;
            return Ok(true);
        }

        if patch.is_data() {
            if !current.configurable && !current.writable() {
                if patch.writable == Some(true) {
                    return reject(throw, "Attempting to change writable attribute of unconfigurable property.");
                }
                if let (Some(value), Some(existing)) = (&patch.value, current.value()) {
                    if !value.same_value(existing) {
                        return reject(throw, "Attempting to change value of a readonly property.");
                    }
                }
            }
            if patch.attributes_equal(&current) && patch.value.is_none() {
                return Ok(true);
            }
            self.redefine(object, key, patch, attributes, &current)?;
            return Ok(true);
        }

        let (current_get, current_set) = match current.kind {
            PropertyKind::Accessor { get, set } => (get, set),
            PropertyKind::Data { .. } => {
                return Err(JsError::internal("accessor redefinition of a data property").into())
            }
        };
        if !current.configurable {
            if patch.setter().is_some_and(|set| set != current_set) {
                return reject(throw, "Attempting to change the setter of an unconfigurable property.");
            }
            if patch.getter().is_some_and(|get| get != current_get) {
                return reject(throw, "Attempting to change the getter of an unconfigurable property.");
            }
        }

        // Accessors synthesized by hooks have no slot to update.
        let Some(entry) = self.own_entry(object, key)? else {
            return Ok(false);
        };
        let slot = self.read_slot(object, entry.offset)?;
        let (cell, _) = self.accessor_pair(&slot)?;
        let pair = self.accessor_pair_mut(cell)?;
        if let Some(setter) = patch.setter() {
            pair.setter = setter;
        }
        if let Some(getter) = patch.getter() {
            pair.getter = getter;
        }
        let pair = *pair;
        if patch.attributes_equal(&current) {
            return Ok(true);
        }

        self.push_root(CellRef::Object(cell));
        self.remove_own_property(object, key)?;
        self.put_accessor_cell(object, key, cell, pair, attributes)?;
        Ok(true)
    }

    /// Replaces an existing own property: the old entry is removed, which
    /// moves the key to the end of the insertion order.
    fn redefine(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
        patch: &PropertyDescriptorPatch,
        attributes: Attributes,
        current: &PropertyDescriptor,
    ) -> ObjectResult<()> {
        if let PropertyKind::Data { value, .. } = &current.kind {
            self.push_root_value(value);
        }
        self.remove_own_property(object, key)?;
        self.put_descriptor(object, key, patch, attributes, Some(current))
    }

    fn push_root_value(&mut self, value: &Value) {
        if let Some(cell) = value_cell(value) {
            self.push_root(cell);
        }
    }

    /// Installs a property from `patch`, taking absent fields from `old`.
    fn put_descriptor(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
        patch: &PropertyDescriptorPatch,
        attributes: Attributes,
        old: Option<&PropertyDescriptor>,
    ) -> ObjectResult<()> {
        let (old_get, old_set) = match old.map(|descriptor| &descriptor.kind) {
            Some(PropertyKind::Accessor { get, set }) => (*get, *set),
            _ => (None, None),
        };

        if patch.is_accessor() || (patch.is_generic() && old.is_some_and(PropertyDescriptor::is_accessor)) {
            let pair = AccessorPair {
                getter: patch.getter().unwrap_or(old_get),
                setter: patch.setter().unwrap_or(old_set),
            };
            return self.put_direct_accessor(object, key, pair, attributes);
        }

        let value = patch
            .value
            .clone()
            .or_else(|| old.and_then(|descriptor| descriptor.value().cloned()))
            .unwrap_or_default();
        self.put_direct_internal(object, key, value, attributes.without_accessor(), PutMode::Define)?;
        Ok(())
    }
}
