//! Objects and the property-access contract.
//!
//! An [`ObjectRef`] is a shared handle to a [`JsObject`]. Every operation
//! borrows the object only for the store step itself; accessors, native
//! callbacks and links run after the borrow is released, so they may touch
//! the same object again.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use core_types::{Attributes, JsError, JsResult, PropertyKey, Strictness};

use crate::config::StorePolicy;
use crate::descriptor::{Descriptor, DescriptorKind};
use crate::function::JsFunction;
use crate::shape::Shape;
use crate::store::{
    ArrayStore, DelegatingStore, DictionaryStore, FunctionProperties, MappedArguments, PropertyStore, SlotRead,
    SlotWrite, StoreId, StoreKind,
};
use crate::value::Value;

/// Object state: one property store, a prototype link and the extensible
/// flag.
#[derive(Debug)]
pub struct JsObject {
    store: PropertyStore,
    prototype: Option<ObjectRef>,
    extensible: bool,
    policy: StorePolicy,
}

impl JsObject {
    /// Extensible object over `store`.
    pub fn new(store: PropertyStore, prototype: Option<ObjectRef>, policy: StorePolicy) -> Self {
        JsObject {
            store,
            prototype,
            extensible: true,
            policy,
        }
    }

    /// The property store.
    pub fn store(&self) -> &PropertyStore {
        &self.store
    }

    /// Store thresholds this object was created with.
    pub fn policy(&self) -> StorePolicy {
        self.policy
    }
}

/// Shared, single-threaded handle to an object.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<JsObject>>);

impl ObjectRef {
    /// Wraps `object`.
    pub fn new(object: JsObject) -> Self {
        ObjectRef(Rc::new(RefCell::new(object)))
    }

    /// Ordinary object with no properties yet, using the installed
    /// [`StorePolicy`].
    pub fn ordinary(prototype: Option<ObjectRef>) -> Self {
        Self::with_policy(prototype, StorePolicy::installed())
    }

    /// Ordinary object using `policy` for the store it allocates later.
    pub fn with_policy(prototype: Option<ObjectRef>, policy: StorePolicy) -> Self {
        Self::new(JsObject::new(PropertyStore::Empty, prototype, policy))
    }

    /// Array-like object with dense elements.
    pub fn array(values: Vec<Value>, prototype: Option<ObjectRef>) -> Self {
        let policy = StorePolicy::installed();
        let store = PropertyStore::Array(ArrayStore::from_values(values, policy));
        Self::new(JsObject::new(store, prototype, policy))
    }

    /// Argument object aliasing `parameters`, plus a hidden `length`.
    pub fn arguments(parameters: Rc<RefCell<Vec<Value>>>, prototype: Option<ObjectRef>) -> Self {
        let policy = StorePolicy::installed();
        let count = parameters.borrow().len();
        let mut base = DictionaryStore::new(policy);
        base.define_own_property(Descriptor::value(
            PropertyKey::from("length"),
            Value::Smi(count as i32),
            Attributes::hidden(),
        ));
        let store = DelegatingStore::new(base, Box::new(MappedArguments::new(parameters)));
        Self::new(JsObject::new(PropertyStore::Delegating(store), prototype, policy))
    }

    /// Function object exposing `length` and `name`.
    pub fn function(function: JsFunction, prototype: Option<ObjectRef>) -> Self {
        let policy = StorePolicy::installed();
        let store = DelegatingStore::new(
            DictionaryStore::new(policy),
            Box::new(FunctionProperties::new(function)),
        );
        Self::new(JsObject::new(PropertyStore::Delegating(store), prototype, policy))
    }

    /// Non-extensible object with an empty store. Never holds anything.
    pub fn sink() -> Self {
        let mut object = JsObject::new(PropertyStore::Empty, None, StorePolicy::installed());
        object.extensible = false;
        Self::new(object)
    }

    /// Store thresholds copied in when this object was created.
    pub fn policy(&self) -> StorePolicy {
        self.0.borrow().policy
    }

    /// True if both handles point at the same object.
    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Current storage strategy.
    pub fn store_kind(&self) -> StoreKind {
        self.0.borrow().store.kind()
    }

    /// Identity of the current store.
    pub fn store_id(&self) -> StoreId {
        self.0.borrow().store.id()
    }

    /// Current shape, if the store is shape-backed.
    pub fn shape(&self) -> Option<Arc<Shape>> {
        self.0.borrow().store.shape().cloned()
    }

    /// Runs `f` against the store. `f` must not call back into this object.
    pub fn with_store<R>(&self, f: impl FnOnce(&PropertyStore) -> R) -> R {
        f(&self.0.borrow().store)
    }

    /// Runs `f` against the mutable store. `f` must not call back into this
    /// object.
    pub fn with_store_mut<R>(&self, f: impl FnOnce(&mut PropertyStore) -> R) -> R {
        f(&mut self.0.borrow_mut().store)
    }

    /// True if `key` is an own property.
    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.0.borrow().store.has_own_property(key)
    }

    /// Snapshot of the own property `key`.
    pub fn get_own_descriptor(&self, key: &PropertyKey) -> Option<Descriptor> {
        self.0.borrow().store.get_own_descriptor(key)
    }

    /// Reads an own property. `Ok(None)` if there is none.
    pub fn try_get_property(&self, key: &PropertyKey) -> JsResult<Option<Value>> {
        let read = self.0.borrow().store.read(key);
        match read {
            SlotRead::Missing => Ok(None),
            SlotRead::Data(value) => Ok(Some(value)),
            SlotRead::Deferred(desc) => desc.get(self).map(Some),
        }
    }

    /// Sloppy-mode [`ObjectRef::set_property`].
    pub fn try_set_property(&self, key: PropertyKey, value: Value) -> JsResult<bool> {
        self.set_property(key, value, Strictness::Sloppy)
    }

    /// Writes an own property, adding it when absent and the object is
    /// extensible.
    ///
    /// Rejections follow `strictness`: `Ok(false)` when sloppy, `TypeError`
    /// when strict.
    pub fn set_property(&self, key: PropertyKey, value: Value, strictness: Strictness) -> JsResult<bool> {
        let write = self.0.borrow_mut().store.write(&key, &value);
        match write {
            SlotWrite::Written => Ok(true),
            SlotWrite::ReadOnly => reject_read_only(&key, strictness),
            SlotWrite::Deferred(mut desc) => desc.set(self, value, strictness),
            SlotWrite::Missing => self.add_data_property(key, value, strictness),
        }
    }

    /// Deletes an own property. False if it is not configurable.
    pub fn delete(&self, key: &PropertyKey) -> bool {
        self.0.borrow_mut().store.delete(key)
    }

    /// [`ObjectRef::delete`] with a `TypeError` for strict callers.
    pub fn delete_with(&self, key: &PropertyKey, strictness: Strictness) -> JsResult<bool> {
        if self.delete(key) {
            Ok(true)
        } else {
            strictness.reject(format!("Cannot delete property '{}'", key))
        }
    }

    /// Installs or replaces an own property.
    ///
    /// # Errors
    ///
    /// `TypeError` when a non-configurable property forbids the change or
    /// the object is not extensible.
    pub fn define_own_property(&self, desc: Descriptor) -> JsResult<()> {
        let name = desc.name().clone();
        if self.try_define_own_property(desc) {
            Ok(())
        } else {
            Err(JsError::type_error(format!("Cannot redefine property: {}", name)))
        }
    }

    /// [`ObjectRef::define_own_property`] reporting failure as `false`.
    pub fn try_define_own_property(&self, desc: Descriptor) -> bool {
        if let DescriptorKind::Linked(link) = &desc.kind {
            if !link.can_install(self, desc.name()) {
                tracing::trace!(key = %desc.name(), "rejected link to itself or to another link");
                return false;
            }
        }
        let mut object = self.0.borrow_mut();
        if !object.extensible && !object.store.has_own_property(desc.name()) {
            return false;
        }
        let policy = object.policy;
        object.store.define_own_property(desc, policy)
    }

    /// Own keys: index keys ascending, then string keys in insertion order.
    pub fn keys(&self) -> Vec<PropertyKey> {
        self.0.borrow().store.keys()
    }

    /// Property lookup through the prototype chain. Accessors found on a
    /// prototype run with this object as the receiver.
    pub fn get(&self, key: &PropertyKey) -> JsResult<Value> {
        let mut current = self.clone();
        loop {
            let read = current.0.borrow().store.read(key);
            match read {
                SlotRead::Data(value) => return Ok(value),
                SlotRead::Deferred(desc) => return desc.get(self),
                SlotRead::Missing => {}
            }
            match current.prototype() {
                Some(next) => current = next,
                None => return Ok(Value::Undefined),
            }
        }
    }

    /// Assignment through the prototype chain.
    ///
    /// An inherited read-only data property blocks the write; an inherited
    /// accessor receives it with this object as the receiver; otherwise the
    /// value lands on this object.
    pub fn put(&self, key: PropertyKey, value: Value, strictness: Strictness) -> JsResult<bool> {
        let write = self.0.borrow_mut().store.write(&key, &value);
        match write {
            SlotWrite::Written => return Ok(true),
            SlotWrite::ReadOnly => return reject_read_only(&key, strictness),
            SlotWrite::Deferred(mut desc) => return desc.set(self, value, strictness),
            SlotWrite::Missing => {}
        }

        let mut next = self.prototype();
        while let Some(proto) = next {
            if let Some(mut desc) = proto.get_own_descriptor(&key) {
                if !desc.kind.is_data() {
                    return desc.set(self, value, strictness);
                }
                if !desc.is_writable() {
                    return reject_read_only(&key, strictness);
                }
                break;
            }
            next = proto.prototype();
        }
        self.add_data_property(key, value, strictness)
    }

    /// Forbids new properties from now on.
    pub fn prevent_extensions(&self) {
        self.0.borrow_mut().extensible = false;
    }

    /// True if new properties may be added.
    pub fn is_extensible(&self) -> bool {
        self.0.borrow().extensible
    }

    /// The prototype.
    pub fn prototype(&self) -> Option<ObjectRef> {
        self.0.borrow().prototype.clone()
    }

    /// Replaces the prototype. False if that would create a cycle, or if the
    /// object is not extensible and the prototype differs.
    pub fn set_prototype(&self, prototype: Option<ObjectRef>) -> bool {
        let current = self.prototype();
        let unchanged = match (&current, &prototype) {
            (None, None) => true,
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        };
        if unchanged {
            return true;
        }
        if !self.is_extensible() {
            return false;
        }

        let mut cursor = prototype.clone();
        while let Some(candidate) = cursor {
            if candidate.ptr_eq(self) {
                return false;
            }
            cursor = candidate.prototype();
        }
        self.0.borrow_mut().prototype = prototype;
        true
    }

    fn add_data_property(&self, key: PropertyKey, value: Value, strictness: Strictness) -> JsResult<bool> {
        if !self.is_extensible() {
            return strictness.reject(format!("Cannot add property {}, object is not extensible", key));
        }
        let desc = Descriptor::value(key, value, Attributes::default());
        Ok(self.try_define_own_property(desc))
    }
}

fn reject_read_only(key: &PropertyKey, strictness: Strictness) -> JsResult<bool> {
    strictness.reject(format!("Cannot assign to read only property '{}'", key))
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(object) => f
                .debug_struct("ObjectRef")
                .field("kind", &object.store.kind())
                .field("store", &object.store.id().raw())
                .field("extensible", &object.extensible)
                .finish(),
            Err(_) => f.write_str("ObjectRef(<borrowed>)"),
        }
    }
}
