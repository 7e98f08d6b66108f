//! The runtime context.
//!
//! A [`Runtime`] owns everything the object model needs: the identifier
//! pool, the object and structure arenas, the allocator and the collector.
//! Every operation goes through it; there is no global state.

use crate::config::RuntimeConfig;
use crate::error::{ObjectError, ObjectResult};
use crate::object::{
    AccessorPair, ClassInfo, JsObject, NativeFunction, ObjectData, ObjectKind, FUNCTION_CLASS,
    GETTER_SETTER_CLASS, OBJECT_CLASS,
};
use crate::structure::Structure;
use core_types::{IdentifierPool, JsError, ObjectRef, PropertyKey, StructureRef, Value};
use memory_manager::{
    Allocator, Arena, BudgetAllocator, CellRef, Collector, GcStats, HeapGraph, Trace, Tracer,
};
use rustc_hash::FxHashMap;
use std::mem;
use std::rc::Rc;

/// Returns the cell a value refers to, if any.
pub(crate) fn value_cell(value: &Value) -> Option<CellRef> {
    value.as_object().map(CellRef::Object)
}

/// Execution context for the object model.
///
/// # Example
///
/// ```
/// use core_types::Value;
/// use object_model::Runtime;
///
/// let mut runtime = Runtime::new();
/// let object = runtime.create_object(None).unwrap();
/// let x = runtime.intern("x");
///
/// runtime.put(object, x, Value::Smi(1), true).unwrap();
/// assert_eq!(runtime.get(object, x).unwrap(), Value::Smi(1));
/// ```
pub struct Runtime {
    config: RuntimeConfig,
    identifiers: IdentifierPool,
    pub(crate) structures: Arena<Structure>,
    pub(crate) objects: Arena<JsObject>,
    allocator: Box<dyn Allocator>,
    collector: Collector,
    persistent_roots: Vec<CellRef>,
    temp_roots: Vec<CellRef>,
    /// Shared empty structures per (prototype, class); entries do not keep
    /// the structure alive.
    prototype_structures: FxHashMap<(Option<ObjectRef>, &'static str), StructureRef>,
    pub(crate) proto_key: PropertyKey,
}

impl Runtime {
    /// Creates a runtime with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Creates a runtime whose heap budget comes from `config`.
    pub fn with_config(config: RuntimeConfig) -> Self {
        let allocator = Box::new(BudgetAllocator::new(config.heap.heap_limit_bytes));
        Self::with_allocator(config, allocator)
    }

    /// Creates a runtime drawing memory from a custom allocator.
    pub fn with_allocator(config: RuntimeConfig, allocator: Box<dyn Allocator>) -> Self {
        let mut identifiers = IdentifierPool::new();
        let proto_key = identifiers.intern("__proto__");
        Runtime {
            config,
            identifiers,
            structures: Arena::new(),
            objects: Arena::new(),
            allocator,
            collector: Collector::new(),
            persistent_roots: Vec::new(),
            temp_roots: Vec::new(),
            prototype_structures: FxHashMap::default(),
            proto_key,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Interns a property name.
    pub fn intern(&mut self, name: &str) -> PropertyKey {
        self.identifiers.intern(name)
    }

    /// Returns the text of an interned key.
    pub fn resolve(&self, key: PropertyKey) -> &str {
        self.identifiers.resolve(key)
    }

    /// The identifier pool.
    pub fn identifiers(&self) -> &IdentifierPool {
        &self.identifiers
    }

    // ---------------------------------------------------------------------
    // Cell access
    // ---------------------------------------------------------------------

    /// Returns the structure behind a handle.
    pub fn structure(&self, structure: StructureRef) -> ObjectResult<&Structure> {
        self.structures
            .get(structure.index())
            .ok_or(ObjectError::InvalidHandle(CellRef::Structure(structure)))
    }

    pub(crate) fn structure_mut(&mut self, structure: StructureRef) -> ObjectResult<&mut Structure> {
        self.structures
            .get_mut(structure.index())
            .ok_or(ObjectError::InvalidHandle(CellRef::Structure(structure)))
    }

    /// Returns the object behind a handle.
    pub fn object(&self, object: ObjectRef) -> ObjectResult<&JsObject> {
        self.objects
            .get(object.index())
            .ok_or(ObjectError::InvalidHandle(CellRef::Object(object)))
    }

    pub(crate) fn object_mut(&mut self, object: ObjectRef) -> ObjectResult<&mut JsObject> {
        self.objects
            .get_mut(object.index())
            .ok_or(ObjectError::InvalidHandle(CellRef::Object(object)))
    }

    /// The current structure of `object`.
    pub fn structure_of(&self, object: ObjectRef) -> ObjectResult<StructureRef> {
        Ok(self.object(object)?.structure)
    }

    /// Returns true if `object` names a live object.
    pub fn is_live(&self, object: ObjectRef) -> bool {
        self.objects.contains(object.index())
    }

    pub(crate) fn set_structure(
        &mut self,
        object: ObjectRef,
        structure: StructureRef,
    ) -> ObjectResult<()> {
        self.object_mut(object)?.structure = structure;
        Ok(())
    }

    /// Writes a storage slot that the object's structure already covers.
    pub(crate) fn write_slot(
        &mut self,
        object: ObjectRef,
        offset: u32,
        value: Value,
    ) -> ObjectResult<()> {
        if self.object_mut(object)?.storage.set(offset, value) {
            Ok(())
        } else {
            Err(JsError::internal(format!("storage offset {} out of range", offset)).into())
        }
    }

    /// Reads a storage slot.
    pub(crate) fn read_slot(&self, object: ObjectRef, offset: u32) -> ObjectResult<Value> {
        self.object(object)?
            .storage
            .get(offset)
            .cloned()
            .ok_or_else(|| JsError::internal(format!("storage offset {} out of range", offset)).into())
    }

    /// Grows `object`'s storage to at least `capacity` slots.
    pub(crate) fn grow_storage(&mut self, object: ObjectRef, capacity: u32) -> ObjectResult<()> {
        let bytes = self.object(object)?.storage.growth_bytes(capacity);
        if bytes == 0 {
            return Ok(());
        }
        self.with_roots([CellRef::Object(object)], |rt| rt.reserve(bytes))?;
        let cell = self.object_mut(object)?;
        cell.storage.grow_to(capacity);
        cell.charged += bytes;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Allocation
    // ---------------------------------------------------------------------

    /// Charges `bytes` to the allocator, collecting once and retrying on
    /// exhaustion when configured to.
    ///
    /// Anything the caller holds in locals must be rooted before calling.
    pub(crate) fn reserve(&mut self, bytes: usize) -> ObjectResult<()> {
        if self.allocator.allocate(bytes).is_some() {
            return Ok(());
        }
        if self.config.heap.collect_on_exhaustion {
            self.collect_garbage();
            if self.allocator.allocate(bytes).is_some() {
                return Ok(());
            }
        }
        tracing::debug!(requested = bytes, in_use = self.allocator.bytes_in_use(), "heap exhausted");
        Err(ObjectError::OutOfMemory { requested: bytes })
    }

    /// Allocates a fresh root structure.
    ///
    /// Built-ins use this to pre-shape instances; ordinary objects should
    /// use [`structure_for_prototype`](Self::structure_for_prototype) so
    /// that objects with the same prototype share shapes.
    pub fn empty_structure(
        &mut self,
        prototype: Option<ObjectRef>,
        class: &'static ClassInfo,
    ) -> ObjectResult<StructureRef> {
        let roots = prototype.map(CellRef::Object);
        self.with_roots(roots, |rt| rt.reserve(Structure::CELL_SIZE))?;
        let prototype = prototype.map(Value::Object).unwrap_or(Value::Null);
        let index = self.structures.insert(Structure::root(prototype, class));
        Ok(StructureRef::from_index(index))
    }

    /// The shared empty structure for objects of `class` with `prototype`.
    pub fn structure_for_prototype(
        &mut self,
        prototype: Option<ObjectRef>,
        class: &'static ClassInfo,
    ) -> ObjectResult<StructureRef> {
        let cache_key = (prototype, class.name);
        if let Some(structure) = self.prototype_structures.get(&cache_key) {
            if self.structures.contains(structure.index()) {
                return Ok(*structure);
            }
        }
        let structure = self.empty_structure(prototype, class)?;
        self.prototype_structures.insert(cache_key, structure);
        Ok(structure)
    }

    /// Allocates an object with the given structure.
    pub fn create_object_with_structure(
        &mut self,
        structure: StructureRef,
        data: ObjectData,
    ) -> ObjectResult<ObjectRef> {
        let capacity = self.structure(structure)?.storage_capacity;
        let mut cell = JsObject::new(structure, data);
        let growth = cell.storage.growth_bytes(capacity);
        let mut roots = vec![CellRef::Structure(structure)];
        if let ObjectData::GetterSetter(pair) = &cell.data {
            roots.extend(pair.getter.map(CellRef::Object));
            roots.extend(pair.setter.map(CellRef::Object));
        }
        self.with_roots(roots, |rt| rt.reserve(JsObject::CELL_SIZE + growth))?;
        cell.storage.grow_to(capacity);
        cell.charged += growth;
        Ok(ObjectRef::from_index(self.objects.insert(cell)))
    }

    /// Allocates an ordinary object.
    pub fn create_object(&mut self, prototype: Option<ObjectRef>) -> ObjectResult<ObjectRef> {
        let structure = self.structure_for_prototype(prototype, &OBJECT_CLASS)?;
        self.create_object_with_structure(structure, ObjectData::Ordinary)
    }

    /// Allocates a callable host function with a null prototype.
    pub fn create_function(
        &mut self,
        name: &str,
        call: impl Fn(&mut Runtime, Value, &[Value]) -> ObjectResult<Value> + 'static,
    ) -> ObjectResult<ObjectRef> {
        let structure = self.structure_for_prototype(None, &FUNCTION_CLASS)?;
        let call: NativeFunction = Rc::new(call);
        self.create_object_with_structure(
            structure,
            ObjectData::Function {
                name: name.to_string(),
                call,
            },
        )
    }

    /// Allocates the cell stored in an accessor property's slot.
    pub(crate) fn create_getter_setter(&mut self, pair: AccessorPair) -> ObjectResult<ObjectRef> {
        let structure = self.structure_for_prototype(None, &GETTER_SETTER_CLASS)?;
        self.create_object_with_structure(structure, ObjectData::GetterSetter(pair))
    }

    /// Reads the accessor pair held by an accessor property's slot value.
    pub(crate) fn accessor_pair(&self, slot: &Value) -> ObjectResult<(ObjectRef, AccessorPair)> {
        let cell = slot
            .as_object()
            .ok_or_else(|| JsError::internal("accessor slot does not hold a cell"))?;
        match &self.object(cell)?.data {
            ObjectData::GetterSetter(pair) => Ok((cell, *pair)),
            _ => Err(JsError::internal("accessor slot does not hold a getter/setter pair").into()),
        }
    }

    pub(crate) fn accessor_pair_mut(&mut self, cell: ObjectRef) -> ObjectResult<&mut AccessorPair> {
        match &mut self.object_mut(cell)?.data {
            ObjectData::GetterSetter(pair) => Ok(pair),
            _ => Err(JsError::internal("not a getter/setter pair").into()),
        }
    }

    /// Returns the function object `value` refers to, if it is callable.
    pub(crate) fn callable(&self, value: &Value) -> Option<ObjectRef> {
        let object = value.as_object()?;
        let cell = self.objects.get(object.index())?;
        (cell.kind() == ObjectKind::Function).then_some(object)
    }

    /// Invokes a host function.
    pub fn call(&mut self, function: ObjectRef, this: Value, args: &[Value]) -> ObjectResult<Value> {
        let call = match &self.object(function)?.data {
            ObjectData::Function { call, .. } => Rc::clone(call),
            _ => return Err(ObjectError::type_error("Object is not a function")),
        };
        let mut roots = vec![CellRef::Object(function)];
        roots.extend(value_cell(&this));
        roots.extend(args.iter().filter_map(value_cell));
        self.with_roots(roots, |rt| call(rt, this, args))
    }

    // ---------------------------------------------------------------------
    // Roots and collection
    // ---------------------------------------------------------------------

    /// Keeps `cell` alive until a matching [`remove_root`](Self::remove_root).
    pub fn add_root(&mut self, cell: impl Into<RootCell>) {
        self.persistent_roots.push(cell.into().0);
    }

    /// Drops one registration made by [`add_root`](Self::add_root).
    pub fn remove_root(&mut self, cell: impl Into<RootCell>) {
        let cell = cell.into().0;
        if let Some(position) = self.persistent_roots.iter().rposition(|r| *r == cell) {
            self.persistent_roots.swap_remove(position);
        }
    }

    /// Runs `f` with `roots` kept alive for its duration.
    pub fn with_roots<R>(
        &mut self,
        roots: impl IntoIterator<Item = CellRef>,
        f: impl FnOnce(&mut Runtime) -> R,
    ) -> R {
        let mark = self.temp_roots.len();
        self.temp_roots.extend(roots);
        let result = f(self);
        self.temp_roots.truncate(mark);
        result
    }

    /// Roots `cell` until the innermost enclosing
    /// [`with_roots`](Self::with_roots) returns.
    pub(crate) fn push_root(&mut self, cell: CellRef) {
        self.temp_roots.push(cell);
    }

    /// Runs a full mark and sweep. Returns the number of freed cells.
    pub fn collect_garbage(&mut self) -> usize {
        let roots: Vec<CellRef> = self
            .persistent_roots
            .iter()
            .chain(self.temp_roots.iter())
            .copied()
            .collect();

        let mut collector = mem::take(&mut self.collector);
        let marks = collector.mark(&*self, roots);
        self.collector = collector;

        let mut released = 0;
        let freed_objects = self
            .objects
            .sweep(&marks.objects, |_, object| released += object.charged);
        let freed_structures = self
            .structures
            .sweep(&marks.structures, |_, structure| released += structure.charged);
        self.allocator.release(released);
        self.collector
            .record_sweep(freed_objects, freed_structures, released);

        let structures = &self.structures;
        self.prototype_structures
            .retain(|_, structure| structures.contains(structure.index()));

        tracing::debug!(
            freed_objects,
            freed_structures,
            released,
            "garbage collection finished"
        );
        freed_objects + freed_structures
    }

    /// Collection statistics.
    pub fn gc_stats(&self) -> &GcStats {
        self.collector.stats()
    }

    /// Bytes currently charged to the allocator.
    pub fn bytes_in_use(&self) -> usize {
        self.allocator.bytes_in_use()
    }

    /// Number of live objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of live structures.
    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapGraph for Runtime {
    fn object_slots(&self) -> usize {
        self.objects.slot_count()
    }

    fn structure_slots(&self) -> usize {
        self.structures.slot_count()
    }

    fn trace_cell(&self, cell: CellRef, tracer: &mut Tracer) {
        match cell {
            CellRef::Object(object) => {
                if let Some(object) = self.objects.get(object.index()) {
                    object.trace(tracer);
                }
            }
            CellRef::Structure(structure) => {
                if let Some(structure) = self.structures.get(structure.index()) {
                    structure.trace(tracer);
                }
            }
        }
    }
}

/// A cell accepted by [`Runtime::add_root`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootCell(CellRef);

impl From<CellRef> for RootCell {
    fn from(cell: CellRef) -> Self {
        RootCell(cell)
    }
}

impl From<ObjectRef> for RootCell {
    fn from(object: ObjectRef) -> Self {
        RootCell(CellRef::Object(object))
    }
}

impl From<StructureRef> for RootCell {
    fn from(structure: StructureRef) -> Self {
        RootCell(CellRef::Structure(structure))
    }
}
