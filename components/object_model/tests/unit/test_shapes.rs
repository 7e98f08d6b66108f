//! Structure sharing, lazy tables and dictionary transitions

use core_types::{PropertyKey, Value};
use object_model::{
    Attributes, DictionaryKind, Runtime, RuntimeConfig, INLINE_STORAGE_CAPACITY, OBJECT_CLASS,
};

fn keys(rt: &mut Runtime, names: &[&str]) -> Vec<PropertyKey> {
    names.iter().map(|name| rt.intern(name)).collect()
}

#[test]
fn test_add_delete_add_scenario() {
    let mut rt = Runtime::new();
    let o = rt.create_object(None).unwrap();
    rt.add_root(o);
    let k = keys(&mut rt, &["a", "b", "c"]);
    let s0 = rt.structure_of(o).unwrap();

    rt.put(o, k[0], Value::Smi(1), true).unwrap();
    let s1 = rt.structure_of(o).unwrap();
    assert_ne!(s1, s0);
    assert_eq!(rt.structure(s1).unwrap().edge().unwrap().offset, 0);

    rt.put(o, k[1], Value::Smi(2), true).unwrap();
    let s2 = rt.structure_of(o).unwrap();
    assert_eq!(rt.structure(s2).unwrap().edge().unwrap().offset, 1);
    assert_eq!(rt.structure(s2).unwrap().previous(), Some(s1));

    assert!(rt.delete_property(o, k[0]).unwrap());
    let d1 = rt.structure_of(o).unwrap();
    let dictionary = rt.structure(d1).unwrap();
    assert!(dictionary.is_dictionary());
    assert_eq!(dictionary.previous(), None);
    assert_eq!(dictionary.table().unwrap().deleted_offsets(), &[0]);
    assert_eq!(rt.object(o).unwrap().storage().get(0), Some(&Value::Undefined));

    rt.put(o, k[2], Value::Smi(3), true).unwrap();
    assert_eq!(rt.structure_of(o).unwrap(), d1);
    let storage = rt.object(o).unwrap().storage();
    assert_eq!(storage.get(0), Some(&Value::Smi(3)));
    assert_eq!(storage.get(1), Some(&Value::Smi(2)));

    assert_eq!(rt.get(o, k[1]).unwrap(), Value::Smi(2));
    assert_eq!(rt.get(o, k[0]).unwrap(), Value::Undefined);
    assert_eq!(rt.own_property_keys(o, false).unwrap(), vec![k[1], k[2]]);
}

#[test]
fn test_identical_histories_share_structures() {
    let mut rt = Runtime::new();
    let k = keys(&mut rt, &["x", "y", "z"]);
    let objects: Vec<_> = (0..3)
        .map(|_| {
            let o = rt.create_object(None).unwrap();
            rt.add_root(o);
            o
        })
        .collect();

    for (i, o) in objects.iter().enumerate() {
        for key in &k {
            rt.put(*o, *key, Value::Smi(i as i32), true).unwrap();
        }
    }
    let shared = rt.structure_of(objects[0]).unwrap();
    assert!(objects.iter().all(|o| rt.structure_of(*o).unwrap() == shared));

    // A different order is a different shape.
    let other = rt.create_object(None).unwrap();
    rt.put(other, k[1], Value::Smi(0), true).unwrap();
    rt.put(other, k[0], Value::Smi(0), true).unwrap();
    assert_ne!(rt.structure_of(other).unwrap(), rt.structure_of(objects[0]).unwrap());
}

#[test]
fn test_attributes_split_transitions() {
    let mut rt = Runtime::new();
    let x = rt.intern("x");
    let a = rt.create_object(None).unwrap();
    let b = rt.create_object(None).unwrap();
    rt.add_root(a);
    rt.add_root(b);

    rt.put_direct(a, x, Value::Smi(1), Attributes::empty()).unwrap();
    rt.put_direct(b, x, Value::Smi(1), Attributes::READ_ONLY).unwrap();
    let (sa, sb) = (rt.structure_of(a).unwrap(), rt.structure_of(b).unwrap());
    assert_ne!(sa, sb);
    assert_eq!(rt.structure(sa).unwrap().previous(), rt.structure(sb).unwrap().previous());
}

#[test]
fn test_replayed_table_matches_chain() {
    let mut rt = Runtime::new();
    let k = keys(&mut rt, &["p0", "p1", "p2", "p3", "p4", "p5"]);
    let root = rt.empty_structure(None, &OBJECT_CLASS).unwrap();
    rt.add_root(root);

    let mut chain = vec![root];
    for key in &k {
        let last = *chain.last().unwrap();
        let (next, _) = rt
            .add_property_transition(last, *key, Attributes::empty(), None)
            .unwrap();
        chain.push(next);
    }

    for (depth, structure) in chain.iter().enumerate() {
        rt.materialize_table(*structure).unwrap();
        let table = rt.structure(*structure).unwrap().table().unwrap().clone();
        assert_eq!(table.len(), depth);
        for (i, key) in k.iter().enumerate() {
            match table.find(*key) {
                Some(entry) => {
                    assert!(i < depth);
                    assert_eq!(entry.offset, i as u32);
                }
                None => assert!(i >= depth),
            }
        }
    }
}

#[test]
fn test_storage_tracks_structure_capacity() {
    let mut rt = Runtime::new();
    let o = rt.create_object(None).unwrap();
    rt.add_root(o);
    assert_eq!(rt.object(o).unwrap().storage().capacity(), INLINE_STORAGE_CAPACITY);

    for i in 0..40 {
        let key = rt.intern(&format!("k{}", i));
        rt.put(o, key, Value::Smi(i), true).unwrap();
        let structure = rt.structure_of(o).unwrap();
        let capacity = rt.structure(structure).unwrap().storage_capacity();
        assert_eq!(rt.object(o).unwrap().storage().capacity(), capacity);
        assert!(capacity > i as u32);
    }
    assert_eq!(rt.object(o).unwrap().storage().capacity(), 64);
}

#[test]
fn test_long_chain_becomes_cacheable_dictionary() {
    let config = RuntimeConfig::default().with_max_transition_length(8);
    let mut rt = Runtime::with_config(config);
    let o = rt.create_object(None).unwrap();
    rt.add_root(o);

    let mut last = Vec::new();
    for i in 0..12 {
        let key = rt.intern(&format!("k{}", i));
        rt.put(o, key, Value::Smi(i), true).unwrap();
        last.push(key);
    }
    let structure = rt.structure_of(o).unwrap();
    assert_eq!(
        rt.structure(structure).unwrap().dictionary_kind(),
        DictionaryKind::Cacheable
    );
    for (i, key) in last.iter().enumerate() {
        assert_eq!(rt.get(o, *key).unwrap(), Value::Smi(i as i32));
    }

    // Removing from a cacheable dictionary moves to an uncacheable copy.
    rt.delete_property(o, last[0]).unwrap();
    let removed = rt.structure_of(o).unwrap();
    assert_ne!(removed, structure);
    assert_eq!(
        rt.structure(removed).unwrap().dictionary_kind(),
        DictionaryKind::Uncacheable
    );
}

#[test]
fn test_freed_offset_reused_without_growth() {
    let mut rt = Runtime::new();
    let o = rt.create_object(None).unwrap();
    rt.add_root(o);
    let k = keys(&mut rt, &["a", "b", "c", "d", "e"]);
    for key in &k[..4] {
        rt.put(o, *key, Value::Smi(1), true).unwrap();
    }
    rt.delete_property(o, k[2]).unwrap();
    let structure = rt.structure_of(o).unwrap();
    let capacity = rt.structure(structure).unwrap().storage_capacity();

    rt.put(o, k[4], Value::Smi(5), true).unwrap();
    let node = rt.structure(structure).unwrap();
    assert_eq!(node.storage_capacity(), capacity);
    assert_eq!(node.table().unwrap().find(k[4]).unwrap().offset, 2);
    assert!(rt.object(o).unwrap().storage().is_inline());
}

#[test]
fn test_shared_structure_survives_dictionary_conversion() {
    let mut rt = Runtime::new();
    let k = keys(&mut rt, &["a", "b"]);
    let first = rt.create_object(None).unwrap();
    let second = rt.create_object(None).unwrap();
    rt.add_root(first);
    rt.add_root(second);
    for o in [first, second] {
        rt.put(o, k[0], Value::Smi(1), true).unwrap();
        rt.put(o, k[1], Value::Smi(2), true).unwrap();
    }
    let shared = rt.structure_of(first).unwrap();

    rt.delete_property(first, k[0]).unwrap();
    assert_eq!(rt.structure_of(second).unwrap(), shared);
    assert_eq!(rt.get(second, k[0]).unwrap(), Value::Smi(1));
    rt.materialize_table(shared).unwrap();
    assert!(rt.structure(shared).unwrap().table().unwrap().contains(k[0]));
}
