//! Index handles for heap cells.
//!
//! Objects and structures live in arenas owned by the runtime. These handles
//! are the only way to refer to them; they are plain indices, so copying one
//! never affects reachability. The collector decides liveness by tracing.

use std::fmt;

/// Handle to a heap-allocated JavaScript object.
///
/// Two handles are equal exactly when they denote the same object, which is
/// the identity comparison JavaScript uses for objects.
///
/// # Examples
///
/// ```
/// use core_types::ObjectRef;
///
/// let a = ObjectRef::from_index(3);
/// assert_eq!(a.index(), 3);
/// assert_eq!(a, ObjectRef::from_index(3));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(u32);

impl ObjectRef {
    /// Creates a handle from an arena index.
    pub const fn from_index(index: u32) -> Self {
        ObjectRef(index)
    }

    /// Returns the arena index of this handle.
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object#{}", self.0)
    }
}

/// Handle to a structure (shape) node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureRef(u32);

impl StructureRef {
    /// Creates a handle from an arena index.
    pub const fn from_index(index: u32) -> Self {
        StructureRef(index)
    }

    /// Returns the arena index of this handle.
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for StructureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Structure#{}", self.0)
    }
}
