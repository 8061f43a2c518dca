//! Property descriptors.
//!
//! A descriptor is the per-property contract: attributes plus how the value
//! is produced and updated. It is independent of the storage strategy; every
//! store holds the same [`DescriptorKind`] payloads in its slots.
//!
//! The owner object is not stored in the descriptor. It is passed to
//! [`Descriptor::get`] and [`Descriptor::set`] by whoever reached the
//! descriptor through that owner, and becomes `this` for accessors.

use std::fmt;
use std::rc::Rc;

use core_types::{Attributes, JsError, JsResult, PropertyKey, Strictness};

use crate::error::ConstructionError;
use crate::function::JsFunction;
use crate::object::ObjectRef;
use crate::store::SlotRead;
use crate::value::Value;

type NativeGetter = dyn Fn(&ObjectRef) -> JsResult<Value>;
type NativeSetter = dyn Fn(&ObjectRef, Value) -> JsResult<()>;

/// Host-implemented property callbacks.
#[derive(Clone)]
pub struct NativeProperty {
    getter: Option<Rc<NativeGetter>>,
    setter: Option<Rc<NativeSetter>>,
}

impl NativeProperty {
    /// Builds a native property. At least one callback is required.
    pub fn new(
        getter: Option<Rc<NativeGetter>>,
        setter: Option<Rc<NativeSetter>>,
    ) -> Result<Self, ConstructionError> {
        if getter.is_none() && setter.is_none() {
            return Err(ConstructionError::MissingNativeCallbacks);
        }
        Ok(NativeProperty { getter, setter })
    }

    /// Read-only native property.
    pub fn getter<G>(getter: G) -> Self
    where
        G: Fn(&ObjectRef) -> JsResult<Value> + 'static,
    {
        NativeProperty {
            getter: Some(Rc::new(getter)),
            setter: None,
        }
    }

    /// Adds a setter callback.
    pub fn with_setter<S>(mut self, setter: S) -> Self
    where
        S: Fn(&ObjectRef, Value) -> JsResult<()> + 'static,
    {
        self.setter = Some(Rc::new(setter));
        self
    }

    /// True if a setter callback is present.
    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }
}

impl fmt::Debug for NativeProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeProperty")
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

/// Forwarding to a property owned by another object.
///
/// Always points at a concrete (non-linked) property: building a link over a
/// linked source collapses to the source's own target.
#[derive(Clone)]
pub struct LinkedProperty {
    target: ObjectRef,
    key: PropertyKey,
}

impl LinkedProperty {
    /// Links to `target[key]`, collapsing any existing link in one step.
    pub fn new(target: &ObjectRef, key: PropertyKey) -> Result<Self, ConstructionError> {
        let source = target
            .get_own_descriptor(&key)
            .ok_or_else(|| ConstructionError::MissingLinkSource(key.clone()))?;
        match source.kind {
            DescriptorKind::Linked(inner) => Ok(inner),
            _ => Ok(LinkedProperty {
                target: target.clone(),
                key,
            }),
        }
    }

    /// Object owning the concrete property.
    pub fn target(&self) -> &ObjectRef {
        &self.target
    }

    /// Key of the concrete property on the target.
    pub fn key(&self) -> &PropertyKey {
        &self.key
    }

    /// False if installing this link as `owner[name]` would make it point
    /// at itself or at another link, or if the source property is gone.
    pub(crate) fn can_install(&self, owner: &ObjectRef, name: &PropertyKey) -> bool {
        if self.target.ptr_eq(owner) && &self.key == name {
            return false;
        }
        match self.target.with_store(|store| store.read(&self.key)) {
            SlotRead::Missing => false,
            SlotRead::Data(_) => true,
            SlotRead::Deferred(source) => !matches!(source.kind, DescriptorKind::Linked(_)),
        }
    }

    fn nested_link(&self) -> JsError {
        JsError::type_error(format!("Linked property '{}' resolves to another link", self.key))
    }

    fn get(&self) -> JsResult<Value> {
        let read = self.target.with_store(|store| store.read(&self.key));
        match read {
            SlotRead::Missing => Ok(Value::Undefined),
            SlotRead::Data(value) => Ok(value),
            SlotRead::Deferred(source) if matches!(source.kind, DescriptorKind::Linked(_)) => {
                Err(self.nested_link())
            }
            SlotRead::Deferred(source) => source.get(&self.target),
        }
    }

    fn set(&self, value: Value, strictness: Strictness) -> JsResult<bool> {
        let read = self.target.with_store(|store| store.read(&self.key));
        match read {
            SlotRead::Missing => strictness.reject(format!(
                "Cannot set linked property: source '{}' no longer exists",
                self.key
            )),
            SlotRead::Deferred(source) if matches!(source.kind, DescriptorKind::Linked(_)) => {
                Err(self.nested_link())
            }
            SlotRead::Data(_) | SlotRead::Deferred(_) => {
                self.target.set_property(self.key.clone(), value, strictness)
            }
        }
    }
}

impl fmt::Debug for LinkedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedProperty")
            .field("target", &self.target)
            .field("key", &self.key)
            .finish()
    }
}

/// Kind-specific descriptor payload.
#[derive(Debug, Clone)]
pub enum DescriptorKind {
    /// Plain data property.
    Value(Value),
    /// Getter/setter pair; either may be absent.
    Accessor {
        /// Called with `this` = owner
        getter: Option<JsFunction>,
        /// Called with `this` = owner and the assigned value
        setter: Option<JsFunction>,
    },
    /// Host callbacks.
    Native(NativeProperty),
    /// Forwarding to another object's property.
    Linked(LinkedProperty),
}

impl DescriptorKind {
    /// True for plain data.
    #[inline]
    pub fn is_data(&self) -> bool {
        matches!(self, DescriptorKind::Value(_))
    }

    /// The stored value of a data property.
    #[inline]
    pub fn data(&self) -> Option<&Value> {
        match self {
            DescriptorKind::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// A property descriptor: name, attributes and payload.
///
/// Cloning produces an independent descriptor: data values are copied and
/// callables are shared immutable handles.
///
/// # Examples
///
/// ```
/// use core_types::{Attributes, PropertyKey, Strictness};
/// use object_model::{Descriptor, ObjectRef, Value};
///
/// let owner = ObjectRef::ordinary(None);
/// let mut desc = Descriptor::value(PropertyKey::from_name("x"), Value::Smi(1), Attributes::empty());
///
/// assert_eq!(desc.get(&owner).unwrap(), Value::Smi(1));
/// assert_eq!(desc.set(&owner, Value::Smi(2), Strictness::Sloppy), Ok(false));
/// assert!(desc.set(&owner, Value::Smi(2), Strictness::Strict).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Descriptor {
    name: PropertyKey,
    attributes: Attributes,
    /// Payload
    pub kind: DescriptorKind,
}

impl Descriptor {
    /// Assembles a descriptor from its parts.
    pub fn new(name: PropertyKey, attributes: Attributes, kind: DescriptorKind) -> Self {
        Descriptor {
            name,
            attributes,
            kind,
        }
    }

    /// Data descriptor.
    pub fn value(name: PropertyKey, value: Value, attributes: Attributes) -> Self {
        Self::new(name, attributes, DescriptorKind::Value(value))
    }

    /// Accessor descriptor. `WRITABLE` is meaningless for accessors and is
    /// dropped.
    pub fn accessor(
        name: PropertyKey,
        getter: Option<JsFunction>,
        setter: Option<JsFunction>,
        attributes: Attributes,
    ) -> Self {
        Self::new(
            name,
            attributes - Attributes::WRITABLE,
            DescriptorKind::Accessor { getter, setter },
        )
    }

    /// Host-callback descriptor.
    pub fn native(name: PropertyKey, native: NativeProperty, attributes: Attributes) -> Self {
        Self::new(name, attributes, DescriptorKind::Native(native))
    }

    /// Descriptor named `name` forwarding to `target[source_key]`.
    ///
    /// Fails fast when the source property does not exist.
    pub fn linked(
        name: PropertyKey,
        target: &ObjectRef,
        source_key: PropertyKey,
        attributes: Attributes,
    ) -> Result<Self, ConstructionError> {
        let link = LinkedProperty::new(target, source_key)?;
        Ok(Self::new(name, attributes, DescriptorKind::Linked(link)))
    }

    /// Property name.
    pub fn name(&self) -> &PropertyKey {
        &self.name
    }

    /// Property attributes.
    pub fn attributes(&self) -> Attributes {
        self.attributes
    }

    /// True if writable.
    pub fn is_writable(&self) -> bool {
        self.attributes.is_writable()
    }

    /// True if enumerable.
    pub fn is_enumerable(&self) -> bool {
        self.attributes.is_enumerable()
    }

    /// True if configurable.
    pub fn is_configurable(&self) -> bool {
        self.attributes.is_configurable()
    }

    /// Splits into name, attributes and payload.
    pub fn into_parts(self) -> (PropertyKey, Attributes, DescriptorKind) {
        (self.name, self.attributes, self.kind)
    }

    /// Reads the property as seen from `owner`.
    pub fn get(&self, owner: &ObjectRef) -> JsResult<Value> {
        match &self.kind {
            DescriptorKind::Value(value) => Ok(value.clone()),
            DescriptorKind::Accessor { getter, .. } => match getter {
                Some(getter) => getter.call(&Value::Object(owner.clone()), &[]),
                None => Ok(Value::Undefined),
            },
            DescriptorKind::Native(native) => match &native.getter {
                Some(getter) => getter(owner),
                None => Ok(Value::Undefined),
            },
            DescriptorKind::Linked(link) => link.get(),
        }
    }

    /// Writes the property as seen from `owner`.
    ///
    /// Returns `Ok(true)` when the write was accepted. Rejections follow
    /// `strictness`: `Ok(false)` when sloppy, `TypeError` when strict.
    pub fn set(&mut self, owner: &ObjectRef, value: Value, strictness: Strictness) -> JsResult<bool> {
        match &mut self.kind {
            DescriptorKind::Value(slot) => {
                if !self.attributes.is_writable() {
                    return strictness.reject(format!(
                        "Cannot assign to read only property '{}'",
                        self.name
                    ));
                }
                *slot = value;
                Ok(true)
            }
            DescriptorKind::Accessor { setter, .. } => match setter {
                Some(setter) => {
                    setter.call(&Value::Object(owner.clone()), &[value])?;
                    Ok(true)
                }
                None => strictness.reject(format!(
                    "Cannot set property '{}' which has only a getter",
                    self.name
                )),
            },
            DescriptorKind::Native(native) => match &native.setter {
                Some(setter) => {
                    setter(owner, value)?;
                    Ok(true)
                }
                None => strictness.reject(format!(
                    "Cannot set property '{}' which has only a getter",
                    self.name
                )),
            },
            DescriptorKind::Linked(link) => link.set(value, strictness),
        }
    }
}
