//! Typed access boxes for `obj[number]` sites.
//!
//! A box binds one object together with the store id it had at binding
//! time. The fast path runs only while the object still owns that very
//! store, with the expected storage kind, and the key is a canonical array
//! index. Anything else (a converted store, `3.5`, `-1`, a string key) takes
//! the general path through `object_model`. A box never relearns: only
//! `set_value` rebinds it.

use std::cell::Cell;

use core_types::{index_from_f64, JsError, JsResult, PropertyKey, Strictness};
use object_model::{ObjectRef, PropertyStore, SlotRead, StoreId, StoreKind, Value};

/// Fast-path and fallback counters.
#[derive(Debug, Clone, Default)]
pub struct BoxStats {
    fast_hits: Cell<u64>,
    fallbacks: Cell<u64>,
}

impl BoxStats {
    /// Accesses served by the fast path.
    pub fn fast_hits(&self) -> u64 {
        self.fast_hits.get()
    }

    /// Accesses that took the general path.
    pub fn fallbacks(&self) -> u64 {
        self.fallbacks.get()
    }

    pub(crate) fn record_hit(&self) {
        self.fast_hits.set(self.fast_hits.get() + 1);
    }

    pub(crate) fn record_fallback(&self) {
        self.fallbacks.set(self.fallbacks.get() + 1);
    }
}

/// Canonical array index denoted by a numeric key.
fn numeric_index(key: &Value) -> Option<u32> {
    key.as_number().and_then(index_from_f64)
}

#[derive(Debug, Clone)]
struct Binding {
    object: ObjectRef,
    expected: StoreKind,
    store: StoreId,
}

impl Binding {
    fn new(object: ObjectRef, expected: StoreKind) -> Self {
        let store = object.store_id();
        Binding {
            object,
            expected,
            store,
        }
    }

    fn matches(&self, store: &PropertyStore) -> bool {
        store.id() == self.store && store.kind() == self.expected
    }

    fn is_current(&self) -> bool {
        self.object.with_store(|store| self.matches(store))
    }

    fn fast_get(&self, index: u32) -> Option<Value> {
        self.object.with_store(|store| {
            if !self.matches(store) {
                return None;
            }
            match store {
                PropertyStore::Array(array) => array.get_index(index),
                other => match other.read(&PropertyKey::Index(index)) {
                    SlotRead::Data(value) => Some(value),
                    _ => None,
                },
            }
        })
    }

    fn fast_set(&self, index: u32, value: &Value) -> bool {
        self.object.with_store_mut(|store| {
            if !self.matches(store) {
                return false;
            }
            store
                .as_array_mut()
                .map_or(false, |array| array.set_index(index, value.clone()))
        })
    }
}

/// Access box bound to an object whose store kind is known up front.
#[derive(Debug, Clone)]
pub struct KnownTypeBox {
    binding: Binding,
    stats: BoxStats,
}

impl KnownTypeBox {
    /// Binds `object`, expecting its store to be of kind `expected`.
    pub fn new(object: ObjectRef, expected: StoreKind) -> Self {
        KnownTypeBox {
            binding: Binding::new(object, expected),
            stats: BoxStats::default(),
        }
    }

    /// Rebinds to `object`, capturing its current store id.
    pub fn set_value(&mut self, object: ObjectRef) {
        self.binding = Binding::new(object, self.binding.expected);
    }

    /// The bound object.
    pub fn value(&self) -> &ObjectRef {
        &self.binding.object
    }

    /// True while the fast path is still valid.
    pub fn is_fast(&self) -> bool {
        self.binding.is_current()
    }

    /// Hit/fallback counters.
    pub fn stats(&self) -> &BoxStats {
        &self.stats
    }

    /// `object[key]`.
    pub fn get(&self, key: &Value) -> JsResult<Value> {
        if let Some(value) = numeric_index(key).and_then(|index| self.binding.fast_get(index)) {
            self.stats.record_hit();
            return Ok(value);
        }
        self.stats.record_fallback();
        tracing::trace!(key = %key, "known-type box fallback on get");
        self.binding.object.get(&key.to_property_key())
    }

    /// `object[key] = value`.
    pub fn set(&self, key: &Value, value: Value, strictness: Strictness) -> JsResult<bool> {
        if numeric_index(key).map_or(false, |index| self.binding.fast_set(index, &value)) {
            self.stats.record_hit();
            return Ok(true);
        }
        self.stats.record_fallback();
        tracing::trace!(key = %key, "known-type box fallback on set");
        self.binding.object.put(key.to_property_key(), value, strictness)
    }
}

/// Access box over an arbitrary value.
///
/// Binds only when the value is an object whose store has the expected
/// kind; otherwise every access takes the general path.
#[derive(Debug, Clone)]
pub struct UnknownTypeBox {
    value: Value,
    expected: StoreKind,
    binding: Option<Binding>,
    stats: BoxStats,
}

impl UnknownTypeBox {
    /// Box over `value`, expecting store kind `expected`.
    pub fn new(value: Value, expected: StoreKind) -> Self {
        let binding = Self::bind(&value, expected);
        UnknownTypeBox {
            value,
            expected,
            binding,
            stats: BoxStats::default(),
        }
    }

    fn bind(value: &Value, expected: StoreKind) -> Option<Binding> {
        let object = value.as_object()?;
        (object.store_kind() == expected).then(|| Binding::new(object.clone(), expected))
    }

    /// Rebinds to `value`.
    pub fn set_value(&mut self, value: Value) {
        self.binding = Self::bind(&value, self.expected);
        self.value = value;
    }

    /// The boxed value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// True if the value was bound at the last `new`/`set_value`.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// True while the fast path is still valid.
    pub fn is_fast(&self) -> bool {
        self.binding.as_ref().map_or(false, Binding::is_current)
    }

    /// Hit/fallback counters.
    pub fn stats(&self) -> &BoxStats {
        &self.stats
    }

    /// `value[key]`.
    pub fn get(&self, key: &Value) -> JsResult<Value> {
        let fast = match (&self.binding, numeric_index(key)) {
            (Some(binding), Some(index)) => binding.fast_get(index),
            _ => None,
        };
        if let Some(value) = fast {
            self.stats.record_hit();
            return Ok(value);
        }
        self.stats.record_fallback();
        tracing::trace!(key = %key, "unknown-type box fallback on get");
        self.value.get_property(&key.to_property_key())
    }

    /// `value[key] = new_value`.
    pub fn set(&self, key: &Value, new_value: Value, strictness: Strictness) -> JsResult<bool> {
        let fast = match (&self.binding, numeric_index(key)) {
            (Some(binding), Some(index)) => binding.fast_set(index, &new_value),
            _ => false,
        };
        if fast {
            self.stats.record_hit();
            return Ok(true);
        }
        self.stats.record_fallback();
        tracing::trace!(key = %key, "unknown-type box fallback on set");

        let property = key.to_property_key();
        match &self.value {
            Value::Object(object) => object.put(property, new_value, strictness),
            Value::Undefined | Value::Null => Err(JsError::type_error(format!(
                "Cannot set properties of {} (setting '{}')",
                self.value, property
            ))),
            primitive => strictness.reject(format!(
                "Cannot create property '{}' on {} '{}'",
                property,
                primitive.type_of(),
                primitive
            )),
        }
    }
}
