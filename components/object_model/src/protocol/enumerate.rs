use crate::error::ObjectResult;
use crate::runtime::Runtime;
use core_types::{ObjectRef, PropertyKey};
use memory_manager::CellRef;
use rustc_hash::FxHashSet;

impl Runtime {
    /// Own keys of `object` in insertion order.
    ///
    /// Keys synthesized by exotic hooks come first. Non-enumerable keys are
    /// skipped unless `include_non_enumerable` is set.
    pub fn own_property_keys(
        &mut self,
        object: ObjectRef,
        include_non_enumerable: bool,
    ) -> ObjectResult<Vec<PropertyKey>> {
        self.with_roots([CellRef::Object(object)], |rt| {
            Ok(rt
                .own_keys_with_visibility(object)?
                .into_iter()
                .filter(|(_, enumerable)| include_non_enumerable || *enumerable)
                .map(|(key, _)| key)
                .collect())
        })
    }

    /// Every own key of `object` paired with its enumerability.
    fn own_keys_with_visibility(
        &mut self,
        object: ObjectRef,
    ) -> ObjectResult<Vec<(PropertyKey, bool)>> {
        let mut keys = Vec::new();
        let mut synthesized = FxHashSet::default();
        if let Some(hooks) = self.hooks_of(object)? {
            for key in hooks.own_keys(self, object) {
                if synthesized.insert(key) {
                    let enumerable = hooks
                        .get_own_property(self, object, key)
                        .map_or(true, |descriptor| descriptor.enumerable);
                    keys.push((key, enumerable));
                }
            }
        }

        let structure = self.structure_of(object)?;
        self.materialize_table(structure)?;
        if let Some(table) = self.structure(structure)?.table() {
            keys.extend(
                table
                    .iter()
                    .filter(|entry| !synthesized.contains(&entry.key))
                    .map(|entry| (entry.key, entry.attributes.is_enumerable())),
            );
        }
        Ok(keys)
    }

    /// Keys of `object` and its prototype chain, nearest first.
    ///
    /// Each key is reported once, at its first occurrence. A hidden own key
    /// still shadows the same key further up the chain.
    pub fn enumerate(
        &mut self,
        object: ObjectRef,
        include_non_enumerable: bool,
    ) -> ObjectResult<Vec<PropertyKey>> {
        self.with_roots([CellRef::Object(object)], |rt| {
            let mut seen = FxHashSet::default();
            let mut keys = Vec::new();
            let mut current = Some(object);
            while let Some(link) = current {
                for (key, enumerable) in rt.own_keys_with_visibility(link)? {
                    if seen.insert(key) && (include_non_enumerable || enumerable) {
                        keys.push(key);
                    }
                }
                current = rt.prototype_link(link)?;
            }
            Ok(keys)
        })
    }
}
