//! Rooting, collection and heap exhaustion

use core_types::Value;
use memory_manager::{Allocation, Allocator, BudgetAllocator, HeapConfig};
use object_model::{ObjectError, Runtime, RuntimeConfig};
use std::cell::Cell;
use std::rc::Rc;

/// Budget allocator that refuses everything while `refuse` is set.
struct SwitchableAllocator {
    inner: BudgetAllocator,
    refuse: Rc<Cell<bool>>,
}

impl Allocator for SwitchableAllocator {
    fn allocate(&mut self, size: usize) -> Option<Allocation> {
        if self.refuse.get() {
            return None;
        }
        self.inner.allocate(size)
    }

    fn release(&mut self, size: usize) {
        self.inner.release(size);
    }

    fn bytes_in_use(&self) -> usize {
        self.inner.bytes_in_use()
    }
}

fn switchable_runtime() -> (Runtime, Rc<Cell<bool>>) {
    let refuse = Rc::new(Cell::new(false));
    let allocator = SwitchableAllocator {
        inner: BudgetAllocator::new(1 << 20),
        refuse: Rc::clone(&refuse),
    };
    let rt = Runtime::with_allocator(RuntimeConfig::default(), Box::new(allocator));
    (rt, refuse)
}

#[test]
fn test_unreachable_cells_are_freed() {
    let mut rt = Runtime::new();
    let keep = rt.create_object(None).unwrap();
    rt.add_root(keep);
    let x = rt.intern("x");
    rt.put(keep, x, Value::Smi(1), true).unwrap();

    for i in 0..10 {
        let garbage = rt.create_object(Some(keep)).unwrap();
        let key = rt.intern(&format!("g{}", i));
        rt.put(garbage, key, Value::Smi(i), true).unwrap();
    }
    let before = rt.bytes_in_use();
    assert_eq!(rt.object_count(), 11);

    let freed = rt.collect_garbage();
    assert!(freed >= 10);
    assert_eq!(rt.object_count(), 1);
    assert!(rt.bytes_in_use() < before);
    assert_eq!(rt.get(keep, x).unwrap(), Value::Smi(1));
    assert_eq!(rt.gc_stats().collections, 1);
}

#[test]
fn test_values_keep_objects_alive() {
    let mut rt = Runtime::new();
    let holder = rt.create_object(None).unwrap();
    rt.add_root(holder);
    let (child, f) = (rt.intern("child"), rt.intern("f"));
    let inner = rt.create_object(None).unwrap();
    rt.put(holder, child, Value::Object(inner), true).unwrap();
    let function = rt.create_function("f", |_, _, _| Ok(Value::Smi(5))).unwrap();
    rt.put(holder, f, Value::Object(function), true).unwrap();

    rt.collect_garbage();
    assert!(rt.is_live(inner));
    assert!(rt.is_live(function));

    rt.delete_property(holder, child).unwrap();
    rt.collect_garbage();
    assert!(!rt.is_live(inner));
    assert_eq!(rt.call(function, Value::Undefined, &[]).unwrap(), Value::Smi(5));
}

#[test]
fn test_removed_root_is_collected() {
    let mut rt = Runtime::new();
    let o = rt.create_object(None).unwrap();
    rt.add_root(o);
    rt.collect_garbage();
    assert!(rt.is_live(o));

    rt.remove_root(o);
    rt.collect_garbage();
    assert!(!rt.is_live(o));
    assert_eq!(rt.structure_count(), 0);
    assert_eq!(rt.bytes_in_use(), 0);
}

#[test]
fn test_exhaustion_leaves_object_unchanged() {
    let (mut rt, refuse) = switchable_runtime();
    let o = rt.create_object(None).unwrap();
    rt.add_root(o);
    let keys: Vec<_> = (0..5).map(|i| rt.intern(&format!("k{}", i))).collect();
    for key in &keys[..4] {
        rt.put(o, *key, Value::Smi(1), true).unwrap();
    }
    let structure = rt.structure_of(o).unwrap();

    refuse.set(true);
    let err = rt.put(o, keys[4], Value::Smi(1), true).unwrap_err();
    assert!(matches!(err, ObjectError::OutOfMemory { .. }));
    assert!(err.as_exception().is_none());
    assert_eq!(rt.structure_of(o).unwrap(), structure);
    assert!(rt.object(o).unwrap().storage().is_inline());

    refuse.set(false);
    assert!(!rt.has_own_property(o, keys[4]).unwrap());
    assert!(rt.put(o, keys[4], Value::Smi(1), true).unwrap());
    assert!(!rt.object(o).unwrap().storage().is_inline());
}

#[test]
fn test_collection_on_exhaustion_makes_room() {
    let config = RuntimeConfig::default().with_heap(HeapConfig::default().with_heap_limit(4096));
    let mut rt = Runtime::with_config(config);
    let x = rt.intern("x");
    for i in 0..200 {
        let o = rt.create_object(None).unwrap();
        rt.put(o, x, Value::Smi(i), true).unwrap();
    }
    assert!(rt.gc_stats().collections > 0);
    assert!(rt.bytes_in_use() <= 4096);
}

#[test]
fn test_without_collection_exhaustion_is_reported() {
    let heap = HeapConfig::default()
        .with_heap_limit(4096)
        .with_collect_on_exhaustion(false);
    let mut rt = Runtime::with_config(RuntimeConfig::default().with_heap(heap));
    let result = (0..1000).try_for_each(|_| rt.create_object(None).map(drop));
    match result {
        Err(ObjectError::OutOfMemory { requested }) => assert!(requested > 0),
        other => panic!("expected exhaustion, got {:?}", other),
    }
    assert_eq!(rt.gc_stats().collections, 0);
}

#[test]
fn test_dictionary_additions_are_charged() {
    let (mut rt, refuse) = switchable_runtime();
    let o = rt.create_object(None).unwrap();
    rt.add_root(o);
    let keys: Vec<_> = (0..40).map(|i| rt.intern(&format!("k{}", i))).collect();
    for key in &keys[..4] {
        rt.put(o, *key, Value::Smi(1), true).unwrap();
    }
    rt.delete_property(o, keys[0]).unwrap();
    let structure = rt.structure_of(o).unwrap();
    assert!(rt.structure(structure).unwrap().is_dictionary());

    // The freed slot is reused, so only the table itself grows.
    refuse.set(true);
    let err = rt.put(o, keys[4], Value::Smi(1), true).unwrap_err();
    assert!(matches!(err, ObjectError::OutOfMemory { .. }));
    refuse.set(false);
    assert!(!rt.has_own_property(o, keys[4]).unwrap());
    assert_eq!(rt.own_property_keys(o, true).unwrap(), keys[1..4].to_vec());

    let before = rt.bytes_in_use();
    for key in &keys[4..] {
        rt.put(o, *key, Value::Smi(1), true).unwrap();
    }
    assert_eq!(rt.structure_of(o).unwrap(), structure);
    assert!(rt.bytes_in_use() > before);

    rt.remove_root(o);
    rt.collect_garbage();
    assert_eq!(rt.bytes_in_use(), 0);
}
