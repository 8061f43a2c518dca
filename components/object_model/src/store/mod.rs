//! Per-object property storage strategies.
//!
//! Every object owns exactly one [`PropertyStore`]. The variants form a
//! closed set, dispatched with exhaustive matches:
//!
//! - [`PropertyStore::Empty`] - holds nothing; the terminal "sink" store
//! - [`DictionaryStore`] - general keyed storage backed by a shape
//! - [`ArrayStore`] - dense index storage for array-like objects
//! - [`DelegatingStore`] - a dictionary wrapped by per-kind overrides
//!
//! When an object must change strategy (array → dictionary) its store is
//! replaced wholesale and receives a fresh [`StoreId`]; nothing cached
//! against the old id is valid afterwards.
//!
//! Reads and writes are two-phase: a store answers directly for plain data
//! and hands back the descriptor ([`SlotRead::Deferred`],
//! [`SlotWrite::Deferred`]) when a callable must run. The object invokes it
//! after releasing its borrow, so getters and setters may re-enter the
//! object freely.

mod array;
mod delegating;
mod dictionary;
mod fast;

pub use array::ArrayStore;
pub use delegating::{DelegatingStore, FunctionProperties, MappedArguments, StoreOverrides};
pub use dictionary::DictionaryStore;
pub use fast::FastStore;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use core_types::{Attributes, PropertyKey};

use crate::config::StorePolicy;
use crate::descriptor::{Descriptor, DescriptorKind};
use crate::shape::Shape;
use crate::value::Value;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one concrete store instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StoreId(u64);

impl StoreId {
    /// Id reported by the empty store.
    pub const EMPTY: Self = StoreId(0);

    pub(crate) fn next() -> Self {
        StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get raw value.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Storage strategy of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    /// No storage
    Empty,
    /// Shape-backed (or, after heavy mutation, map-backed) keyed storage
    Dictionary,
    /// Dense integer-indexed storage
    Array,
    /// Dictionary with per-kind overrides
    Delegating,
}

/// Outcome of the read phase.
#[derive(Debug, Clone)]
pub enum SlotRead {
    /// No own property.
    Missing,
    /// Plain data, already resolved.
    Data(Value),
    /// A callable must run with the owner; invoke [`Descriptor::get`].
    Deferred(Descriptor),
}

/// Outcome of the write phase.
#[derive(Debug, Clone)]
pub enum SlotWrite {
    /// Data stored.
    Written,
    /// No own property; the caller decides whether to add one.
    Missing,
    /// The own data property is not writable.
    ReadOnly,
    /// A callable must run with the owner; invoke [`Descriptor::set`].
    Deferred(Descriptor),
}

/// Signals that an array store must become a dictionary before the
/// operation can proceed. Nothing was mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Degrade;

pub(crate) fn read_kind(key: &PropertyKey, attributes: Attributes, kind: &DescriptorKind) -> SlotRead {
    match kind {
        DescriptorKind::Value(value) => SlotRead::Data(value.clone()),
        other => SlotRead::Deferred(Descriptor::new(key.clone(), attributes, other.clone())),
    }
}

pub(crate) fn write_kind(
    key: &PropertyKey,
    attributes: Attributes,
    kind: &mut DescriptorKind,
    value: &Value,
) -> SlotWrite {
    match kind {
        DescriptorKind::Value(stored) => {
            if attributes.is_writable() {
                *stored = value.clone();
                SlotWrite::Written
            } else {
                SlotWrite::ReadOnly
            }
        }
        other => SlotWrite::Deferred(Descriptor::new(key.clone(), attributes, other.clone())),
    }
}

/// Whether `desc` may replace a property currently holding
/// `current_attrs`/`current_kind`.
pub(crate) fn can_redefine(
    current_attrs: Attributes,
    current_kind: &DescriptorKind,
    desc: &Descriptor,
) -> bool {
    if current_attrs.is_configurable() {
        return true;
    }
    if desc.is_configurable() || desc.is_enumerable() != current_attrs.is_enumerable() {
        return false;
    }
    match (current_kind, &desc.kind) {
        (DescriptorKind::Value(old), DescriptorKind::Value(new)) => {
            current_attrs.is_writable() || (!desc.is_writable() && old == new)
        }
        (
            DescriptorKind::Accessor {
                getter: old_get,
                setter: old_set,
            },
            DescriptorKind::Accessor {
                getter: new_get,
                setter: new_set,
            },
        ) => same_function(old_get, new_get) && same_function(old_set, new_set),
        _ => false,
    }
}

fn same_function(a: &Option<crate::JsFunction>, b: &Option<crate::JsFunction>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.ptr_eq(b),
        _ => false,
    }
}

/// Index keys ascending, then string keys in the given (insertion) order.
pub(crate) fn order_keys(keys: impl IntoIterator<Item = PropertyKey>) -> Vec<PropertyKey> {
    let mut indices = Vec::new();
    let mut names = Vec::new();
    for key in keys {
        match key {
            PropertyKey::Index(i) => indices.push(i),
            named => names.push(named),
        }
    }
    indices.sort_unstable();
    indices.dedup();
    indices
        .into_iter()
        .map(PropertyKey::Index)
        .chain(names)
        .collect()
}

/// The property storage of one object.
#[derive(Debug)]
pub enum PropertyStore {
    /// Nothing stored. Definitions on an extensible owner replace it with a
    /// dictionary store.
    Empty,
    /// General keyed storage.
    Dictionary(DictionaryStore),
    /// Dense array storage.
    Array(ArrayStore),
    /// Dictionary with overrides.
    Delegating(DelegatingStore),
}

impl PropertyStore {
    /// Storage strategy.
    pub fn kind(&self) -> StoreKind {
        match self {
            PropertyStore::Empty => StoreKind::Empty,
            PropertyStore::Dictionary(_) => StoreKind::Dictionary,
            PropertyStore::Array(_) => StoreKind::Array,
            PropertyStore::Delegating(_) => StoreKind::Delegating,
        }
    }

    /// Identity of this store instance.
    pub fn id(&self) -> StoreId {
        match self {
            PropertyStore::Empty => StoreId::EMPTY,
            PropertyStore::Dictionary(d) => d.id(),
            PropertyStore::Array(a) => a.id(),
            PropertyStore::Delegating(d) => d.id(),
        }
    }

    /// Shape describing the keyed properties, if shape-backed.
    pub fn shape(&self) -> Option<&Arc<Shape>> {
        match self {
            PropertyStore::Empty | PropertyStore::Array(_) => None,
            PropertyStore::Dictionary(d) => d.shape(),
            PropertyStore::Delegating(d) => d.shape(),
        }
    }

    /// Slot storage matching [`PropertyStore::shape`].
    pub fn fast(&self) -> Option<&FastStore> {
        match self {
            PropertyStore::Empty | PropertyStore::Array(_) => None,
            PropertyStore::Dictionary(d) => d.fast(),
            PropertyStore::Delegating(d) => d.fast(),
        }
    }

    /// Mutable slot storage matching [`PropertyStore::shape`].
    pub fn fast_mut(&mut self) -> Option<&mut FastStore> {
        match self {
            PropertyStore::Empty | PropertyStore::Array(_) => None,
            PropertyStore::Dictionary(d) => d.fast_mut(),
            PropertyStore::Delegating(d) => d.fast_mut(),
        }
    }

    /// The array store, if this is one.
    pub fn as_array(&self) -> Option<&ArrayStore> {
        match self {
            PropertyStore::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The mutable array store, if this is one.
    pub fn as_array_mut(&mut self) -> Option<&mut ArrayStore> {
        match self {
            PropertyStore::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The dictionary store, if this is one.
    pub fn as_dictionary(&self) -> Option<&DictionaryStore> {
        match self {
            PropertyStore::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// True if `key` is an own property.
    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        match self {
            PropertyStore::Empty => false,
            PropertyStore::Dictionary(d) => d.has_own_property(key),
            PropertyStore::Array(a) => a.has_own_property(key),
            PropertyStore::Delegating(d) => d.has_own_property(key),
        }
    }

    /// Snapshot of the own property `key`.
    pub fn get_own_descriptor(&self, key: &PropertyKey) -> Option<Descriptor> {
        match self {
            PropertyStore::Empty => None,
            PropertyStore::Dictionary(d) => d.get_own_descriptor(key),
            PropertyStore::Array(a) => a.get_own_descriptor(key),
            PropertyStore::Delegating(d) => d.get_own_descriptor(key),
        }
    }

    /// Read phase for the own property `key`.
    pub fn read(&self, key: &PropertyKey) -> SlotRead {
        match self {
            PropertyStore::Empty => SlotRead::Missing,
            PropertyStore::Dictionary(d) => d.read(key),
            PropertyStore::Array(a) => a.read(key),
            PropertyStore::Delegating(d) => d.read(key),
        }
    }

    /// Write phase for an existing own property `key`.
    pub fn write(&mut self, key: &PropertyKey, value: &Value) -> SlotWrite {
        match self {
            PropertyStore::Empty => SlotWrite::Missing,
            PropertyStore::Dictionary(d) => d.write(key, value),
            PropertyStore::Array(a) => a.write(key, value),
            PropertyStore::Delegating(d) => d.write(key, value),
        }
    }

    /// Removes `key`. True if removed or absent, false if not configurable.
    pub fn delete(&mut self, key: &PropertyKey) -> bool {
        let result = match self {
            PropertyStore::Empty => Ok(true),
            PropertyStore::Dictionary(d) => Ok(d.delete(key)),
            PropertyStore::Delegating(d) => Ok(d.delete(key)),
            PropertyStore::Array(a) => a.delete(key),
        };
        match result {
            Ok(removed) => removed,
            Err(Degrade) => {
                self.convert_to_dictionary();
                self.delete(key)
            }
        }
    }

    /// Installs or replaces an own property.
    ///
    /// Returns false if an existing non-configurable property forbids the
    /// change. On an empty store this allocates a dictionary store using
    /// `policy`.
    pub fn define_own_property(&mut self, desc: Descriptor, policy: StorePolicy) -> bool {
        if let PropertyStore::Empty = self {
            *self = PropertyStore::Dictionary(DictionaryStore::new(policy));
        }
        let result = match self {
            // replaced above
            PropertyStore::Empty => Ok(false),
            PropertyStore::Dictionary(d) => Ok(d.define_own_property(desc)),
            PropertyStore::Delegating(d) => Ok(d.define_own_property(desc)),
            PropertyStore::Array(a) => a.define_own_property(desc),
        };
        match result {
            Ok(defined) => defined,
            Err((Degrade, desc)) => {
                self.convert_to_dictionary();
                self.define_own_property(desc, policy)
            }
        }
    }

    /// Own keys: index keys ascending, then string keys in insertion order.
    pub fn keys(&self) -> Vec<PropertyKey> {
        match self {
            PropertyStore::Empty => Vec::new(),
            PropertyStore::Dictionary(d) => d.keys(),
            PropertyStore::Array(a) => a.keys(),
            PropertyStore::Delegating(d) => d.keys(),
        }
    }

    /// Replaces an array store by an equivalent dictionary store.
    ///
    /// Monotonic: nothing ever turns a dictionary back into an array.
    pub fn convert_to_dictionary(&mut self) {
        if let PropertyStore::Array(_) = self {
            if let PropertyStore::Array(array) = std::mem::replace(self, PropertyStore::Empty) {
                let old_id = array.id();
                let dictionary = array.into_dictionary();
                tracing::debug!(
                    from = old_id.raw(),
                    to = dictionary.id().raw(),
                    "array store converted to dictionary"
                );
                *self = PropertyStore::Dictionary(dictionary);
            }
        }
    }
}
