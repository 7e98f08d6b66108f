//! Errors raised by the object model.

use core_types::JsError;
use memory_manager::CellRef;
use thiserror::Error;

/// Failure of an object-model operation.
///
/// `Exception` is script-visible and catchable; the other variants are
/// engine-level conditions that scripts never observe as exceptions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    /// A JavaScript exception, e.g. a TypeError in strict mode
    #[error("{0}")]
    Exception(JsError),

    /// The allocator refused a request even after a collection
    #[error("out of memory: failed to allocate {requested} bytes")]
    OutOfMemory {
        /// Bytes that were requested
        requested: usize,
    },

    /// A handle that does not name a live cell
    #[error("invalid heap handle {0:?}")]
    InvalidHandle(CellRef),
}

impl ObjectError {
    /// Shorthand for a TypeError exception.
    pub fn type_error(message: impl Into<String>) -> Self {
        ObjectError::Exception(JsError::type_error(message))
    }

    /// Returns the JavaScript exception, if this is one.
    pub fn as_exception(&self) -> Option<&JsError> {
        match self {
            ObjectError::Exception(error) => Some(error),
            _ => None,
        }
    }
}

impl From<JsError> for ObjectError {
    fn from(error: JsError) -> Self {
        ObjectError::Exception(error)
    }
}

/// Result type for object-model operations.
pub type ObjectResult<T> = Result<T, ObjectError>;
