//! Tracing and the mark phase.
//!
//! Every cell type implements [`Trace`], enumerating the handles it owns at
//! that instant. The [`Collector`] walks the graph from a root set using a
//! work-stealing deque as its gray stack (tri-color marking: a bit set means
//! gray or black, the deque holds the gray cells) and returns the resulting
//! [`MarkBits`]; sweeping is left to the owner of the arenas.

use core_types::{ObjectRef, StructureRef, Value};
use crossbeam_deque::Worker;

/// A reference to any traced heap cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellRef {
    /// An object cell
    Object(ObjectRef),
    /// A structure cell
    Structure(StructureRef),
}

/// Growable bitset indexed by arena slot.
#[derive(Debug, Clone, Default)]
pub struct MarkBitmap {
    words: Vec<u64>,
}

impl MarkBitmap {
    /// Creates a bitmap able to hold `len` bits, all clear.
    pub fn with_len(len: usize) -> Self {
        MarkBitmap {
            words: vec![0; len.div_ceil(64)],
        }
    }

    /// Sets bit `index`. Returns true if it was previously clear.
    pub fn set(&mut self, index: u32) -> bool {
        let word = (index / 64) as usize;
        let bit = 1u64 << (index % 64);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let was_clear = self.words[word] & bit == 0;
        self.words[word] |= bit;
        was_clear
    }

    /// Returns whether bit `index` is set.
    pub fn is_set(&self, index: u32) -> bool {
        let word = (index / 64) as usize;
        self.words
            .get(word)
            .is_some_and(|w| w & (1u64 << (index % 64)) != 0)
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Result of a mark phase: which objects and structures are reachable.
#[derive(Debug, Clone, Default)]
pub struct MarkBits {
    /// Reachable object slots
    pub objects: MarkBitmap,
    /// Reachable structure slots
    pub structures: MarkBitmap,
}

impl MarkBits {
    /// Returns true if `cell` was reached.
    pub fn is_marked(&self, cell: CellRef) -> bool {
        match cell {
            CellRef::Object(r) => self.objects.is_set(r.index()),
            CellRef::Structure(r) => self.structures.is_set(r.index()),
        }
    }
}

/// Visitor handed to [`Trace::trace`].
pub struct Tracer {
    gray: Worker<CellRef>,
    marks: MarkBits,
}

impl Tracer {
    fn new(object_slots: usize, structure_slots: usize) -> Self {
        Tracer {
            gray: Worker::new_lifo(),
            marks: MarkBits {
                objects: MarkBitmap::with_len(object_slots),
                structures: MarkBitmap::with_len(structure_slots),
            },
        }
    }

    /// Marks an object reachable.
    pub fn visit_object(&mut self, object: ObjectRef) {
        if self.marks.objects.set(object.index()) {
            self.gray.push(CellRef::Object(object));
        }
    }

    /// Marks a structure reachable.
    pub fn visit_structure(&mut self, structure: StructureRef) {
        if self.marks.structures.set(structure.index()) {
            self.gray.push(CellRef::Structure(structure));
        }
    }

    /// Marks the object behind `value`, if any.
    pub fn visit_value(&mut self, value: &Value) {
        if let Value::Object(object) = value {
            self.visit_object(*object);
        }
    }

    /// Marks any cell.
    pub fn visit_cell(&mut self, cell: CellRef) {
        match cell {
            CellRef::Object(r) => self.visit_object(r),
            CellRef::Structure(r) => self.visit_structure(r),
        }
    }
}

/// Enumerates the heap references a cell owns.
pub trait Trace {
    /// Reports every owned reference to `tracer`.
    fn trace(&self, tracer: &mut Tracer);
}

impl Trace for Value {
    fn trace(&self, tracer: &mut Tracer) {
        tracer.visit_value(self);
    }
}

impl<T: Trace> Trace for Option<T> {
    fn trace(&self, tracer: &mut Tracer) {
        if let Some(inner) = self {
            inner.trace(tracer);
        }
    }
}

/// The heap as seen by the collector.
pub trait HeapGraph {
    /// Number of object slots (live or free).
    fn object_slots(&self) -> usize;

    /// Number of structure slots (live or free).
    fn structure_slots(&self) -> usize;

    /// Traces the cell behind `cell`. Dead handles are ignored.
    fn trace_cell(&self, cell: CellRef, tracer: &mut Tracer);
}

/// Collection statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GcStats {
    /// Number of completed collections
    pub collections: usize,
    /// Cells found reachable by the last mark phase
    pub last_marked: usize,
    /// Objects freed over all collections
    pub objects_freed: usize,
    /// Structures freed over all collections
    pub structures_freed: usize,
    /// Bytes handed back to the allocator over all collections
    pub bytes_released: usize,
}

/// Mark-phase driver.
#[derive(Debug, Default)]
pub struct Collector {
    stats: GcStats,
}

impl Collector {
    /// Creates a collector with empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks everything reachable from `roots`.
    pub fn mark<G: HeapGraph>(
        &mut self,
        graph: &G,
        roots: impl IntoIterator<Item = CellRef>,
    ) -> MarkBits {
        let mut tracer = Tracer::new(graph.object_slots(), graph.structure_slots());
        for root in roots {
            tracer.visit_cell(root);
        }
        while let Some(cell) = tracer.gray.pop() {
            graph.trace_cell(cell, &mut tracer);
        }

        let marks = tracer.marks;
        self.stats.last_marked = marks.objects.count() + marks.structures.count();
        tracing::trace!(marked = self.stats.last_marked, "mark phase finished");
        marks
    }

    /// Records the outcome of the sweep that followed a mark phase.
    pub fn record_sweep(&mut self, objects_freed: usize, structures_freed: usize, bytes: usize) {
        self.stats.collections += 1;
        self.stats.objects_freed += objects_freed;
        self.stats.structures_freed += structures_freed;
        self.stats.bytes_released += bytes;
    }

    /// Returns accumulated statistics.
    pub fn stats(&self) -> &GcStats {
        &self.stats
    }
}
