//! Contract tests verifying the memory_manager API other components build on.
//! These tests ensure all exported types and functions exist with correct signatures.

use core_types::{ObjectRef, StructureRef, Value};
use memory_manager::{
    Allocator, Arena, BudgetAllocator, CellRef, Collector, HeapConfig, HeapGraph, Trace, Tracer,
    DEFAULT_HEAP_LIMIT,
};

/// A tiny heap: object `i` holds a list of values, structures hold nothing.
struct ToyHeap {
    objects: Arena<Vec<Value>>,
    structures: Arena<()>,
}

impl HeapGraph for ToyHeap {
    fn object_slots(&self) -> usize {
        self.objects.slot_count()
    }

    fn structure_slots(&self) -> usize {
        self.structures.slot_count()
    }

    fn trace_cell(&self, cell: CellRef, tracer: &mut Tracer) {
        if let CellRef::Object(object) = cell {
            if let Some(values) = self.objects.get(object.index()) {
                for value in values {
                    value.trace(tracer);
                }
            }
        }
    }
}

/// Test BudgetAllocator contract: allocate returns None past the limit
#[test]
fn contract_budget_allocator() {
    let mut allocator = BudgetAllocator::new(64);
    assert_eq!(allocator.allocate(64).map(|a| a.size), Some(64));
    assert!(allocator.allocate(1).is_none());
    assert_eq!(allocator.bytes_in_use(), 64);
    assert_eq!(allocator.failures(), 1);
    allocator.release(32);
    assert_eq!(allocator.bytes_in_use(), 32);
    assert_eq!(allocator.peak(), 64);
}

/// Test Allocator contract: usable as a trait object
#[test]
fn contract_allocator_is_object_safe() {
    let mut allocator: Box<dyn Allocator> = Box::new(BudgetAllocator::new(16));
    assert!(allocator.allocate(8).is_some());
    assert_eq!(allocator.bytes_in_use(), 8);
}

/// Test HeapConfig contract: defaults and JSON loading
#[test]
fn contract_heap_config() {
    let config = HeapConfig::default();
    assert_eq!(config.heap_limit_bytes, DEFAULT_HEAP_LIMIT);
    assert!(config.collect_on_exhaustion);

    let parsed: HeapConfig = serde_json::from_str(r#"{ "heap_limit_bytes": 1024 }"#).unwrap();
    assert_eq!(parsed.heap_limit_bytes, 1024);
    assert!(parsed.collect_on_exhaustion);
}

/// Test Collector contract: mark from roots, then sweep unmarked cells
#[test]
fn contract_mark_and_sweep() {
    let mut heap = ToyHeap {
        objects: Arena::new(),
        structures: Arena::new(),
    };
    let leaf = heap.objects.insert(Vec::new());
    let root = heap
        .objects
        .insert(vec![Value::Object(ObjectRef::from_index(leaf))]);
    let garbage = heap.objects.insert(vec![Value::Smi(1)]);
    let structure = heap.structures.insert(());

    let mut collector = Collector::new();
    let roots = [
        CellRef::Object(ObjectRef::from_index(root)),
        CellRef::Structure(StructureRef::from_index(structure)),
    ];
    let marks = collector.mark(&heap, roots);
    assert!(marks.is_marked(CellRef::Object(ObjectRef::from_index(leaf))));
    assert!(!marks.is_marked(CellRef::Object(ObjectRef::from_index(garbage))));

    let mut freed = Vec::new();
    let count = heap.objects.sweep(&marks.objects, |index, _| freed.push(index));
    collector.record_sweep(count, 0, 0);
    assert_eq!(freed, vec![garbage]);
    assert_eq!(heap.objects.len(), 2);
    assert_eq!(collector.stats().collections, 1);
    assert_eq!(collector.stats().objects_freed, 1);
    assert_eq!(collector.stats().last_marked, 3);

    // Freed slots are reused.
    assert_eq!(heap.objects.insert(Vec::new()), garbage);
}
