//! Object model - shapes, property stores and descriptors
//!
//! This component provides:
//! - Shapes (hidden classes) with deduplicated transitions
//! - Background flattening of deep shape chains into lookup tables
//! - Per-object property stores: empty, dictionary, array and delegating
//! - Property descriptors: data, accessor, native and linked
//! - The property-access contract on [`ObjectRef`]
//!
//! # Examples
//!
//! ```
//! use core_types::PropertyKey;
//! use object_model::{ObjectRef, StoreKind, Value};
//!
//! let obj = ObjectRef::ordinary(None);
//! obj.try_set_property(PropertyKey::from("x"), Value::Smi(1)).unwrap();
//! assert_eq!(obj.store_kind(), StoreKind::Dictionary);
//! assert_eq!(obj.get(&PropertyKey::from("x")).unwrap(), Value::Smi(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod descriptor;
pub mod error;
pub mod flatten;
pub mod function;
pub mod object;
pub mod shape;
pub mod store;
pub mod value;

// Re-export main types
pub use config::{ObjectModelConfig, StorePolicy};
pub use descriptor::{Descriptor, DescriptorKind, LinkedProperty, NativeProperty};
pub use error::{ConfigError, ConstructionError};
pub use flatten::{FlattenConfig, FlattenStats, ShapeFlattener};
pub use function::JsFunction;
pub use object::{JsObject, ObjectRef};
pub use shape::{FlatTable, Shape, ShapeId, SlotInfo, Transition};
pub use store::{
    ArrayStore, DelegatingStore, DictionaryStore, FastStore, FunctionProperties, MappedArguments,
    PropertyStore, SlotRead, SlotWrite, StoreId, StoreKind, StoreOverrides,
};
pub use value::Value;
