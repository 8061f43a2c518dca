//! Inline caches - property access fast paths
//!
//! This component provides:
//! - [`ShapeSlot`]: a per-site named-property cache learning up to four
//!   `(shape, slot)` pairs before going megamorphic ([`SiteState`])
//! - [`KnownTypeBox`] / [`UnknownTypeBox`]: index-keyed access boxes bound to
//!   one object and validated by store identity
//!
//! Every fast path is checked against the object's current shape or store
//! id; on a mismatch the general path in `object_model` runs instead, so a
//! cache never changes the result of an access.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod boxes;
pub mod shape_cache;

pub use boxes::{BoxStats, KnownTypeBox, UnknownTypeBox};
pub use shape_cache::{ShapeSlot, SiteState, MAX_POLYMORPHIC_ENTRIES};
