//! Get/put/delete/define semantics across prototype chains

use core_types::{ErrorKind, ObjectRef, PropertyKey, Value};
use object_model::{
    AccessorPair, Attributes, ClassInfo, ObjectData, ObjectHooks, PropertyDescriptor,
    PropertyDescriptorPatch, PropertyKind, Runtime,
};

#[test]
fn test_getter_only_accessor_blocks_shadowing() {
    let mut rt = Runtime::new();
    let p = rt.create_object(None).unwrap();
    let o = rt.create_object(Some(p)).unwrap();
    rt.add_root(o);
    let x = rt.intern("x");
    let getter = rt.create_function("get x", |_, _, _| Ok(Value::Smi(1))).unwrap();
    let pair = AccessorPair {
        getter: Some(getter),
        setter: None,
    };
    rt.put_direct_accessor(p, x, pair, Attributes::empty()).unwrap();
    let p_structure = rt.structure_of(p).unwrap();

    assert!(!rt.put(o, x, Value::Smi(2), false).unwrap());
    assert!(!rt.has_own_property(o, x).unwrap());
    assert_eq!(rt.structure_of(p).unwrap(), p_structure);
    assert_eq!(rt.get(o, x).unwrap(), Value::Smi(1));

    let err = rt.put(o, x, Value::Smi(2), true).unwrap_err();
    assert_eq!(err.as_exception().unwrap().kind, ErrorKind::TypeError);
}

#[test]
fn test_getter_sees_receiver() {
    let mut rt = Runtime::new();
    let p = rt.create_object(None).unwrap();
    let o = rt.create_object(Some(p)).unwrap();
    rt.add_root(o);
    let (name, greeting) = (rt.intern("name"), rt.intern("greeting"));
    let getter = rt
        .create_function("get greeting", move |rt, this, _| {
            let this = this.as_object().unwrap();
            rt.get(this, name)
        })
        .unwrap();
    let pair = AccessorPair {
        getter: Some(getter),
        setter: None,
    };
    rt.put_direct_accessor(p, greeting, pair, Attributes::empty()).unwrap();
    rt.put(o, name, Value::Smi(9), true).unwrap();

    assert_eq!(rt.get(o, greeting).unwrap(), Value::Smi(9));
    assert_eq!(rt.get(p, greeting).unwrap(), Value::Undefined);
}

#[test]
fn test_freeze_sets_attribute_bits() {
    let mut rt = Runtime::new();
    let o = rt.create_object(None).unwrap();
    rt.add_root(o);
    let (x, y, z) = (rt.intern("x"), rt.intern("y"), rt.intern("z"));
    rt.put(o, x, Value::Smi(1), true).unwrap();
    rt.put_direct(o, y, Value::Smi(2), Attributes::NON_ENUMERABLE).unwrap();
    let getter = rt.create_function("get z", |_, _, _| Ok(Value::Null)).unwrap();
    let pair = AccessorPair {
        getter: Some(getter),
        setter: None,
    };
    rt.put_direct_accessor(o, z, pair, Attributes::empty()).unwrap();

    rt.freeze(o).unwrap();
    assert!(!rt.is_extensible(o).unwrap());
    let structure = rt.structure_of(o).unwrap();
    rt.materialize_table(structure).unwrap();
    for entry in rt.structure(structure).unwrap().table().unwrap().iter() {
        assert!(!entry.attributes.is_configurable());
        if entry.attributes.is_accessor() {
            assert!(!entry.attributes.is_read_only());
        } else {
            assert!(entry.attributes.is_read_only());
        }
    }

    for key in [x, y] {
        assert!(!rt.put(o, key, Value::Smi(0), false).unwrap());
        assert!(rt.put(o, key, Value::Smi(0), true).is_err());
    }
    assert_eq!(rt.get(o, x).unwrap(), Value::Smi(1));
    assert_eq!(rt.get(o, z).unwrap(), Value::Null);
}

#[test]
fn test_rejected_define_leaves_object_unchanged() {
    let mut rt = Runtime::new();
    let o = rt.create_object(None).unwrap();
    rt.add_root(o);
    let x = rt.intern("x");
    let patch = PropertyDescriptorPatch::data(Value::Smi(1), true, true, false);
    assert!(rt.define_own_property(o, x, &patch, true).unwrap());
    let structure = rt.structure_of(o).unwrap();

    let getter = rt.create_function("get", |_, _, _| Ok(Value::Undefined)).unwrap();
    let to_accessor = PropertyDescriptorPatch::accessor(Some(getter), None, true, false);
    let err = rt.define_own_property(o, x, &to_accessor, true).unwrap_err();
    assert_eq!(
        err.to_string(),
        "TypeError: Attempting to change access mechanism for an unconfigurable property."
    );
    assert_eq!(rt.structure_of(o).unwrap(), structure);

    // Writable non-configurable data may still change its value and drop
    // writability.
    let lock = PropertyDescriptorPatch {
        value: Some(Value::Smi(2)),
        writable: Some(false),
        ..Default::default()
    };
    assert!(rt.define_own_property(o, x, &lock, true).unwrap());
    assert_eq!(
        rt.get_own_property_descriptor(o, x).unwrap(),
        Some(PropertyDescriptor {
            enumerable: true,
            configurable: false,
            kind: PropertyKind::Data {
                value: Value::Smi(2),
                writable: false,
            },
        })
    );
}

#[test]
fn test_enumeration_skips_hidden_and_duplicates() {
    let mut rt = Runtime::new();
    let p = rt.create_object(None).unwrap();
    let o = rt.create_object(Some(p)).unwrap();
    rt.add_root(o);
    let (a, b, c) = (rt.intern("a"), rt.intern("b"), rt.intern("c"));
    rt.put(p, a, Value::Smi(1), true).unwrap();
    rt.put(p, c, Value::Smi(1), true).unwrap();
    rt.put(o, b, Value::Smi(1), true).unwrap();
    rt.put(o, a, Value::Smi(1), true).unwrap();
    rt.put_direct(o, c, Value::Smi(1), Attributes::NON_ENUMERABLE).unwrap();

    assert_eq!(rt.enumerate(o, false).unwrap(), vec![b, a]);
    assert_eq!(rt.enumerate(o, true).unwrap(), vec![b, a, c]);
}

#[test]
fn test_property_descriptor_walks_chain() {
    let mut rt = Runtime::new();
    let p = rt.create_object(None).unwrap();
    let o = rt.create_object(Some(p)).unwrap();
    rt.add_root(o);
    let x = rt.intern("x");
    rt.put(p, x, Value::Smi(3), true).unwrap();

    assert_eq!(rt.get_own_property_descriptor(o, x).unwrap(), None);
    assert_eq!(
        rt.get_property_descriptor(o, x).unwrap(),
        Some(PropertyDescriptor::data(Value::Smi(3)))
    );
}

struct LengthHooks;

impl ObjectHooks for LengthHooks {
    fn get_own_property(
        &self,
        rt: &Runtime,
        _object: ObjectRef,
        key: PropertyKey,
    ) -> Option<PropertyDescriptor> {
        (rt.resolve(key) == "length").then(|| PropertyDescriptor {
            enumerable: false,
            configurable: false,
            kind: PropertyKind::Data {
                value: Value::Smi(3),
                writable: false,
            },
        })
    }

    fn own_keys(&self, rt: &Runtime, _object: ObjectRef) -> Vec<PropertyKey> {
        rt.identifiers().get("length").into_iter().collect()
    }
}

static LENGTH_HOOKS: LengthHooks = LengthHooks;
static SIZED_CLASS: ClassInfo = ClassInfo {
    name: "Sized",
    hooks: Some(&LENGTH_HOOKS),
};

#[test]
fn test_hooks_answer_before_table() {
    let mut rt = Runtime::new();
    let length = rt.intern("length");
    let other = rt.intern("other");
    let structure = rt.structure_for_prototype(None, &SIZED_CLASS).unwrap();
    let o = rt.create_object_with_structure(structure, ObjectData::Ordinary).unwrap();
    rt.add_root(o);
    rt.put(o, other, Value::Smi(1), true).unwrap();

    assert_eq!(rt.get(o, length).unwrap(), Value::Smi(3));
    assert!(rt.has_own_property(o, length).unwrap());
    assert!(!rt.delete_property(o, length).unwrap());
    assert_eq!(rt.own_property_keys(o, true).unwrap(), vec![length, other]);
    assert_eq!(rt.own_property_keys(o, false).unwrap(), vec![other]);
}

#[test]
fn test_put_respects_synthesized_read_only_property() {
    let mut rt = Runtime::new();
    let length = rt.intern("length");
    let structure = rt.structure_for_prototype(None, &SIZED_CLASS).unwrap();
    let o = rt.create_object_with_structure(structure, ObjectData::Ordinary).unwrap();
    rt.add_root(o);

    let err = rt.put(o, length, Value::Smi(7), true).unwrap_err();
    assert_eq!(err.as_exception().unwrap().kind, ErrorKind::TypeError);
    assert!(!rt.put(o, length, Value::Smi(7), false).unwrap());

    assert_eq!(rt.structure_of(o).unwrap(), structure);
    assert_eq!(rt.get(o, length).unwrap(), Value::Smi(3));
    assert_eq!(rt.own_property_keys(o, true).unwrap(), vec![length]);

    // Inherited read-only data also blocks shadowing.
    let child = rt.create_object(Some(o)).unwrap();
    rt.add_root(child);
    assert!(!rt.put(child, length, Value::Smi(7), false).unwrap());
    assert!(!rt.has_own_property(child, length).unwrap());
}

#[test]
fn test_synthesized_hidden_key_shadows_prototype() {
    let mut rt = Runtime::new();
    let (length, other) = (rt.intern("length"), rt.intern("other"));
    let p = rt.create_object(None).unwrap();
    rt.add_root(p);
    rt.put(p, length, Value::Smi(1), true).unwrap();
    rt.put(p, other, Value::Smi(1), true).unwrap();
    let structure = rt.structure_for_prototype(Some(p), &SIZED_CLASS).unwrap();
    let o = rt.create_object_with_structure(structure, ObjectData::Ordinary).unwrap();
    rt.add_root(o);

    assert_eq!(rt.enumerate(o, false).unwrap(), vec![other]);
    assert_eq!(rt.enumerate(o, true).unwrap(), vec![length, other]);
}

#[test]
fn test_enumerate_large_chain() {
    let mut rt = Runtime::new();
    let p = rt.create_object(None).unwrap();
    let o = rt.create_object(Some(p)).unwrap();
    rt.add_root(o);
    let keys: Vec<_> = (0..600).map(|i| rt.intern(&format!("k{i}"))).collect();
    for (i, &key) in keys.iter().enumerate() {
        rt.put(p, key, Value::Smi(i as i32), true).unwrap();
        if i % 2 == 0 {
            rt.put(o, key, Value::Smi(0), true).unwrap();
        } else if i % 3 == 0 {
            rt.put_direct(o, key, Value::Smi(0), Attributes::NON_ENUMERABLE).unwrap();
        }
    }

    let expected: Vec<_> = keys
        .iter()
        .step_by(2)
        .chain(keys.iter().enumerate().filter(|(i, _)| i % 6 == 1 || i % 6 == 5).map(|(_, k)| k))
        .copied()
        .collect();
    assert_eq!(rt.enumerate(o, false).unwrap(), expected);
    assert_eq!(rt.enumerate(o, true).unwrap().len(), keys.len());
}
