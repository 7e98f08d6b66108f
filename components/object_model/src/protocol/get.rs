use crate::descriptor::PropertyKind;
use crate::error::ObjectResult;
use crate::runtime::{value_cell, Runtime};
use core_types::{ObjectRef, PropertyKey, Value};
use memory_manager::CellRef;

impl Runtime {
    /// `[[Get]]`: the value of `key` on `object` or its prototype chain.
    ///
    /// Accessors run their getter with `object` as the receiver. A missing
    /// key yields `undefined`.
    pub fn get(&mut self, object: ObjectRef, key: PropertyKey) -> ObjectResult<Value> {
        self.get_with_receiver(object, key, Value::Object(object))
    }

    /// `[[Get]]` starting at `object` with an explicit receiver for getters.
    pub fn get_with_receiver(
        &mut self,
        object: ObjectRef,
        key: PropertyKey,
        receiver: Value,
    ) -> ObjectResult<Value> {
        let roots = std::iter::once(CellRef::Object(object)).chain(value_cell(&receiver));
        self.with_roots(roots, |rt| rt.get_inner(object, key, receiver))
    }

    fn get_inner(&mut self, object: ObjectRef, key: PropertyKey, receiver: Value) -> ObjectResult<Value> {
        let mut current = Some(object);
        while let Some(link) = current {
            if let Some(hooks) = self.hooks_of(link)? {
                if let Some(descriptor) = hooks.get_own_property(self, link, key) {
                    return match descriptor.kind {
                        PropertyKind::Data { value, .. } => Ok(value),
                        PropertyKind::Accessor { get: Some(getter), .. } => {
                            self.call(getter, receiver, &[])
                        }
                        PropertyKind::Accessor { get: None, .. } => Ok(Value::Undefined),
                    };
                }
            }

            if let Some(entry) = self.own_entry(link, key)? {
                let value = self.read_slot(link, entry.offset)?;
                if !entry.attributes.is_accessor() {
                    return Ok(value);
                }
                let (_, pair) = self.accessor_pair(&value)?;
                return match pair.getter {
                    Some(getter) => self.call(getter, receiver, &[]),
                    None => Ok(Value::Undefined),
                };
            }

            if key == self.proto_key {
                let structure = self.structure_of(link)?;
                return Ok(self.structure(structure)?.prototype.clone());
            }
            current = self.prototype_link(link)?;
        }
        Ok(Value::Undefined)
    }

    /// Returns true if `key` is found on `object` or its prototype chain.
    pub fn has_property(&mut self, object: ObjectRef, key: PropertyKey) -> ObjectResult<bool> {
        self.with_roots([CellRef::Object(object)], |rt| {
            let mut current = Some(object);
            while let Some(link) = current {
                if rt.has_own_property(link, key)? {
                    return Ok(true);
                }
                current = rt.prototype_link(link)?;
            }
            Ok(false)
        })
    }

    /// Returns true if `object` itself has `key`.
    pub fn has_own_property(&mut self, object: ObjectRef, key: PropertyKey) -> ObjectResult<bool> {
        if let Some(hooks) = self.hooks_of(object)? {
            if hooks.get_own_property(self, object, key).is_some() {
                return Ok(true);
            }
        }
        Ok(self.own_entry(object, key)?.is_some())
    }
}
