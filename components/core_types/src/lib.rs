//! Core JavaScript value types, handles, identifiers and errors.
//!
//! This crate provides the foundational types shared by the memory manager
//! and the object model.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`ObjectRef`] / [`StructureRef`] - Arena handles for heap cells
//! - [`PropertyKey`] / [`IdentifierPool`] - Interned property names
//! - [`JsError`] - JavaScript errors
//! - [`ErrorKind`] - Types of JavaScript errors
//!
//! # Examples
//!
//! ```
//! use core_types::{IdentifierPool, JsError, ErrorKind, Value};
//!
//! let mut pool = IdentifierPool::new();
//! let key = pool.intern("x");
//! assert_eq!(pool.resolve(key), "x");
//!
//! let num = Value::Smi(42);
//! assert!(num.is_truthy());
//!
//! let error = JsError::type_error("undefined is not a function");
//! assert_eq!(error.kind, ErrorKind::TypeError);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod handle;
mod intern;
mod value;

pub use error::{ErrorKind, JsError};
pub use handle::{ObjectRef, StructureRef};
pub use intern::{IdentifierPool, PropertyKey};
pub use value::Value;
