//! Core types shared by the object model and its inline caches.
//!
//! This crate provides the foundational vocabulary of the property subsystem:
//!
//! - [`PropertyKey`] - canonical property names (array indices or strings)
//! - [`Attributes`] - writable / enumerable / configurable flags
//! - [`Strictness`] - whether rejected operations raise or return `false`
//! - [`JsError`] / [`ErrorKind`] - catchable language-level failures
//!
//! # Examples
//!
//! ```
//! use core_types::{Attributes, ErrorKind, JsError, PropertyKey, Strictness};
//!
//! let key = PropertyKey::from_number(3.0);
//! assert_eq!(key.as_index(), Some(3));
//!
//! let attrs = Attributes::default();
//! assert!(attrs.is_writable());
//!
//! let err = Strictness::Strict.reject("read only").unwrap_err();
//! assert_eq!(err.kind, ErrorKind::TypeError);
//! # let _ = JsError::type_error("x");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod attributes;
mod error;
mod key;

pub use attributes::{Attributes, Strictness};
pub use error::{ErrorKind, JsError, JsResult};
pub use key::{index_from_f64, number_to_key_string, PropertyKey, MAX_ARRAY_INDEX};
