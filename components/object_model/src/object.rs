//! Object cells and class descriptors.

use crate::descriptor::PropertyDescriptor;
use crate::error::ObjectResult;
use crate::runtime::Runtime;
use crate::storage::PropertyStorage;
use core_types::{ObjectRef, PropertyKey, StructureRef, Value};
use memory_manager::{Trace, Tracer};
use std::fmt;
use std::mem;
use std::rc::Rc;

/// Host function backing a callable object: `(runtime, this, args)`.
pub type NativeFunction = Rc<dyn Fn(&mut Runtime, Value, &[Value]) -> ObjectResult<Value>>;

/// Optional overrides for exotic objects.
///
/// The generic protocol consults these before the property table. Returning
/// `None` from `get_own_property` falls back to the table.
pub trait ObjectHooks: Sync {
    /// Synthesized own property for `key`.
    fn get_own_property(
        &self,
        _runtime: &Runtime,
        _object: ObjectRef,
        _key: PropertyKey,
    ) -> Option<PropertyDescriptor> {
        None
    }

    /// Synthesized own keys, listed before the table's keys.
    fn own_keys(&self, _runtime: &Runtime, _object: ObjectRef) -> Vec<PropertyKey> {
        Vec::new()
    }
}

/// Static description of a kind of object.
pub struct ClassInfo {
    /// Class name, e.g. `"Object"`
    pub name: &'static str,
    /// Exotic behavior, if any
    pub hooks: Option<&'static dyn ObjectHooks>,
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("name", &self.name)
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}

/// Ordinary objects.
pub static OBJECT_CLASS: ClassInfo = ClassInfo {
    name: "Object",
    hooks: None,
};

/// Host functions.
pub static FUNCTION_CLASS: ClassInfo = ClassInfo {
    name: "Function",
    hooks: None,
};

/// Internal cells holding an accessor's getter and setter.
pub static GETTER_SETTER_CLASS: ClassInfo = ClassInfo {
    name: "GetterSetter",
    hooks: None,
};

/// Getter and setter of an accessor property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessorPair {
    /// Getter function
    pub getter: Option<ObjectRef>,
    /// Setter function
    pub setter: Option<ObjectRef>,
}

/// Kind tag of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Plain object
    Ordinary,
    /// Callable host function
    Function,
    /// Accessor pair cell
    GetterSetter,
}

/// Kind-specific payload of an object.
#[derive(Clone, Default)]
pub enum ObjectData {
    /// Plain object
    #[default]
    Ordinary,
    /// Callable host function
    Function {
        /// Function name
        name: String,
        /// Implementation
        call: NativeFunction,
    },
    /// Accessor pair stored in the slot of an accessor property
    GetterSetter(AccessorPair),
}

impl ObjectData {
    /// The kind tag.
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectData::Ordinary => ObjectKind::Ordinary,
            ObjectData::Function { .. } => ObjectKind::Function,
            ObjectData::GetterSetter(_) => ObjectKind::GetterSetter,
        }
    }
}

impl fmt::Debug for ObjectData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectData::Ordinary => write!(f, "Ordinary"),
            ObjectData::Function { name, .. } => {
                f.debug_struct("Function").field("name", name).finish()
            }
            ObjectData::GetterSetter(pair) => f.debug_tuple("GetterSetter").field(pair).finish(),
        }
    }
}

/// An object cell.
#[derive(Debug)]
pub struct JsObject {
    pub(crate) structure: StructureRef,
    pub(crate) storage: PropertyStorage,
    pub(crate) data: ObjectData,
    /// Bytes charged to the allocator for this cell.
    pub(crate) charged: usize,
}

impl JsObject {
    /// Approximate size of an object cell with inline storage.
    pub const CELL_SIZE: usize = mem::size_of::<JsObject>();

    pub(crate) fn new(structure: StructureRef, data: ObjectData) -> Self {
        JsObject {
            structure,
            storage: PropertyStorage::new(),
            data,
            charged: Self::CELL_SIZE,
        }
    }

    /// The object's current structure.
    pub fn structure(&self) -> StructureRef {
        self.structure
    }

    /// The object's slot array.
    pub fn storage(&self) -> &PropertyStorage {
        &self.storage
    }

    /// Kind-specific payload.
    pub fn data(&self) -> &ObjectData {
        &self.data
    }

    /// Kind tag.
    pub fn kind(&self) -> ObjectKind {
        self.data.kind()
    }

    /// Returns true for callable objects.
    pub fn is_callable(&self) -> bool {
        self.kind() == ObjectKind::Function
    }
}

impl Trace for JsObject {
    fn trace(&self, tracer: &mut Tracer) {
        tracer.visit_structure(self.structure);
        self.storage.trace(tracer);
        if let ObjectData::GetterSetter(pair) = &self.data {
            if let Some(getter) = pair.getter {
                tracer.visit_object(getter);
            }
            if let Some(setter) = pair.setter {
                tracer.visit_object(setter);
            }
        }
    }
}
