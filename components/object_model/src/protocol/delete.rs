use crate::error::ObjectResult;
use crate::runtime::Runtime;
use core_types::{ObjectRef, PropertyKey};
use memory_manager::CellRef;

impl Runtime {
    /// `[[Delete]]`: removes the own property `key`.
    ///
    /// Returns `Ok(false)` for non-configurable properties and for
    /// properties synthesized by exotic hooks; deleting a missing key
    /// succeeds.
    pub fn delete_property(&mut self, object: ObjectRef, key: PropertyKey) -> ObjectResult<bool> {
        self.with_roots([CellRef::Object(object)], |rt| {
            let Some(entry) = rt.own_entry(object, key)? else {
                if let Some(hooks) = rt.hooks_of(object)? {
                    if hooks.get_own_property(rt, object, key).is_some() {
                        return Ok(false);
                    }
                }
                return Ok(true);
            };
            if !entry.attributes.is_configurable() {
                return Ok(false);
            }
            rt.remove_own_property(object, key)?;
            Ok(true)
        })
    }
}
