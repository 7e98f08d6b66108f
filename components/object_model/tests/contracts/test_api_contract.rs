//! These tests pin the exported types, constants and signatures that other
//! components rely on.

use core_types::{ObjectRef, PropertyKey, StructureRef, Value};
use object_model::{
    Attributes, DictionaryKind, ObjectError, ObjectResult, PropertyDescriptor,
    PropertyDescriptorPatch, Runtime, RuntimeConfig, BASE_EXTERNAL_STORAGE_CAPACITY,
    INLINE_STORAGE_CAPACITY, MAX_SPECIFIC_FUNCTION_THRASH_COUNT, MAX_TRANSITION_LENGTH,
};

/// Contract: storage and transition limits
#[test]
fn contract_constants() {
    assert_eq!(INLINE_STORAGE_CAPACITY, 4);
    assert_eq!(BASE_EXTERNAL_STORAGE_CAPACITY, 16);
    assert_eq!(MAX_TRANSITION_LENGTH, 64);
    assert_eq!(MAX_SPECIFIC_FUNCTION_THRASH_COUNT, 3);
}

/// Contract: default configuration mirrors the constants
#[test]
fn contract_runtime_config_default() {
    let config = RuntimeConfig::default();
    assert_eq!(config.max_transition_length, MAX_TRANSITION_LENGTH);
    assert_eq!(
        config.max_specific_function_thrash_count,
        MAX_SPECIFIC_FUNCTION_THRASH_COUNT
    );
    assert!(config.heap.collect_on_exhaustion);
}

/// Contract: configuration is loadable from JSON with defaults for
/// missing fields
#[test]
fn contract_runtime_config_from_json() {
    let config = RuntimeConfig::from_json(r#"{ "max_transition_length": 10 }"#).unwrap();
    assert_eq!(config.max_transition_length, 10);
    assert_eq!(
        config.max_specific_function_thrash_count,
        MAX_SPECIFIC_FUNCTION_THRASH_COUNT
    );
    assert!(RuntimeConfig::from_json("not json").is_err());
}

/// Contract: attribute bits
#[test]
fn contract_attributes() {
    let all = Attributes::READ_ONLY
        | Attributes::NON_ENUMERABLE
        | Attributes::NON_CONFIGURABLE
        | Attributes::IS_GETTER
        | Attributes::IS_SETTER;
    assert!(all.is_accessor());
    assert!(all.is_read_only());
    assert!(!all.is_enumerable());
    assert!(!all.is_configurable());
    assert!(Attributes::empty().is_enumerable());
}

/// Contract: protocol entry points and their return types
#[test]
fn contract_protocol_signatures() {
    let mut rt = Runtime::new();
    let o: ObjectRef = rt.create_object(None).unwrap();
    let key: PropertyKey = rt.intern("key");
    let structure: StructureRef = rt.structure_of(o).unwrap();

    let _: ObjectResult<bool> = rt.put(o, key, Value::Smi(1), false);
    let _: ObjectResult<Value> = rt.get(o, key);
    let _: ObjectResult<bool> = rt.has_property(o, key);
    let _: ObjectResult<Vec<PropertyKey>> = rt.enumerate(o, false);
    let _: ObjectResult<Option<PropertyDescriptor>> = rt.get_own_property_descriptor(o, key);
    let _: ObjectResult<bool> =
        rt.define_own_property(o, key, &PropertyDescriptorPatch::default(), false);
    let _: ObjectResult<bool> = rt.delete_property(o, key);
    let _: ObjectResult<bool> = rt.set_prototype_of(o, None);
    let _: ObjectResult<()> = rt.seal(o);
    let _: ObjectResult<()> = rt.freeze(o);
    let _: ObjectResult<bool> = rt.is_frozen(o);
    let _: ObjectResult<(StructureRef, u32)> =
        rt.add_property_transition(structure, key, Attributes::empty(), None);
    let _: usize = rt.collect_garbage();
}

/// Contract: a fresh structure is an extensible, non-dictionary root with
/// inline capacity
#[test]
fn contract_fresh_structure() {
    let mut rt = Runtime::new();
    let o = rt.create_object(None).unwrap();
    let structure = rt.structure(rt.structure_of(o).unwrap()).unwrap();
    assert!(structure.is_extensible());
    assert_eq!(structure.dictionary_kind(), DictionaryKind::None);
    assert_eq!(structure.previous(), None);
    assert_eq!(structure.storage_capacity(), INLINE_STORAGE_CAPACITY);
    assert_eq!(structure.transition_count(), 0);
    assert_eq!(structure.prototype(), &Value::Null);
}

/// Contract: script-visible failures are exceptions, exhaustion is not
#[test]
fn contract_error_kinds() {
    let exception = ObjectError::type_error("boom");
    assert!(exception.as_exception().is_some());
    assert_eq!(exception.to_string(), "TypeError: boom");

    let oom = ObjectError::OutOfMemory { requested: 8 };
    assert!(oom.as_exception().is_none());
    assert_eq!(oom.to_string(), "out of memory: failed to allocate 8 bytes");
}
