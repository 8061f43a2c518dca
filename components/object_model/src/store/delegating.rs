//! Dictionary storage with per-kind overrides.
//!
//! Exotic objects (argument objects, functions) expose properties that are
//! not plain dictionary entries. A [`DelegatingStore`] keeps an ordinary
//! [`DictionaryStore`] as its base and consults a [`StoreOverrides`] only for
//! keys the base does not hold. The base's shape, slots and id are reported
//! unchanged, so a cache that learned a slot on the base stays correct.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use core_types::{Attributes, PropertyKey};

use super::{order_keys, read_kind, DictionaryStore, FastStore, SlotRead, SlotWrite, StoreId};
use crate::descriptor::{Descriptor, DescriptorKind};
use crate::function::JsFunction;
use crate::shape::Shape;
use crate::value::Value;

/// Hooks consulted for keys absent from the base dictionary.
///
/// Every hook defaults to "not mine", which forwards to the base.
pub trait StoreOverrides: fmt::Debug {
    /// Short name used in logs.
    fn kind_name(&self) -> &'static str;

    /// Virtual property `key`, if this override supplies one.
    fn get_own_descriptor(&self, _key: &PropertyKey) -> Option<Descriptor> {
        None
    }

    /// True if this override supplies `key`.
    fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.get_own_descriptor(key).is_some()
    }

    /// Read phase for a virtual property.
    fn read(&self, key: &PropertyKey) -> SlotRead {
        match self.get_own_descriptor(key) {
            Some(desc) => read_kind(key, desc.attributes(), &desc.kind),
            None => SlotRead::Missing,
        }
    }

    /// Write phase for a virtual property.
    fn write(&mut self, _key: &PropertyKey, _value: &Value) -> SlotWrite {
        SlotWrite::Missing
    }

    /// Deletes a virtual property. `None` when `key` is not virtual.
    fn delete(&mut self, _key: &PropertyKey) -> Option<bool> {
        None
    }

    /// Intercepts a definition. `None` lets it reach the base dictionary.
    fn define_own_property(&mut self, _desc: &Descriptor) -> Option<bool> {
        None
    }

    /// Virtual keys, in the order they should be listed.
    fn keys(&self) -> Vec<PropertyKey> {
        Vec::new()
    }
}

/// A base dictionary plus overrides.
pub struct DelegatingStore {
    base: DictionaryStore,
    overrides: Box<dyn StoreOverrides>,
}

impl fmt::Debug for DelegatingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatingStore")
            .field("kind", &self.overrides.kind_name())
            .field("base", &self.base)
            .field("overrides", &self.overrides)
            .finish()
    }
}

impl DelegatingStore {
    /// Wraps `base`.
    pub fn new(base: DictionaryStore, overrides: Box<dyn StoreOverrides>) -> Self {
        DelegatingStore { base, overrides }
    }

    /// The base store's id.
    #[inline]
    pub fn id(&self) -> StoreId {
        self.base.id()
    }

    /// The base store's shape.
    #[inline]
    pub fn shape(&self) -> Option<&Arc<Shape>> {
        self.base.shape()
    }

    /// The base store's slots.
    #[inline]
    pub fn fast(&self) -> Option<&FastStore> {
        self.base.fast()
    }

    /// The base store's mutable slots.
    #[inline]
    pub fn fast_mut(&mut self) -> Option<&mut FastStore> {
        self.base.fast_mut()
    }

    /// The wrapped dictionary.
    pub fn base(&self) -> &DictionaryStore {
        &self.base
    }

    /// The installed overrides.
    pub fn overrides(&self) -> &dyn StoreOverrides {
        self.overrides.as_ref()
    }

    /// True if the base or the overrides hold `key`.
    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.base.has_own_property(key) || self.overrides.has_own_property(key)
    }

    /// Snapshot of `key`, base first.
    pub fn get_own_descriptor(&self, key: &PropertyKey) -> Option<Descriptor> {
        self.base
            .get_own_descriptor(key)
            .or_else(|| self.overrides.get_own_descriptor(key))
    }

    /// Read phase.
    pub fn read(&self, key: &PropertyKey) -> SlotRead {
        match self.base.read(key) {
            SlotRead::Missing => self.overrides.read(key),
            found => found,
        }
    }

    /// Write phase.
    pub fn write(&mut self, key: &PropertyKey, value: &Value) -> SlotWrite {
        match self.base.write(key, value) {
            SlotWrite::Missing => self.overrides.write(key, value),
            done => done,
        }
    }

    /// Removes `key` from whichever side holds it.
    pub fn delete(&mut self, key: &PropertyKey) -> bool {
        if self.base.has_own_property(key) {
            return self.base.delete(key);
        }
        self.overrides.delete(key).unwrap_or(true)
    }

    /// Offers the definition to the overrides, then to the base.
    pub fn define_own_property(&mut self, desc: Descriptor) -> bool {
        if !self.base.has_own_property(desc.name()) {
            if let Some(defined) = self.overrides.define_own_property(&desc) {
                return defined;
            }
        }
        self.base.define_own_property(desc)
    }

    /// Virtual keys first, then the base's keys; indices ascending overall.
    pub fn keys(&self) -> Vec<PropertyKey> {
        let virtual_keys = self
            .overrides
            .keys()
            .into_iter()
            .filter(|key| !self.base.has_own_property(key));
        order_keys(virtual_keys.chain(self.base.keys()))
    }
}

/// Argument object whose leading indices alias the callee's parameters.
///
/// Reads and writes of a mapped index go straight to the shared parameter
/// cell. Deleting the index, or redefining it as anything but a plain
/// default-attribute value, severs the alias for good.
pub struct MappedArguments {
    parameters: Rc<RefCell<Vec<Value>>>,
    mapped: Vec<bool>,
}

impl MappedArguments {
    /// Maps every current parameter.
    pub fn new(parameters: Rc<RefCell<Vec<Value>>>) -> Self {
        let count = parameters.borrow().len();
        MappedArguments {
            parameters,
            mapped: vec![true; count],
        }
    }

    /// True while `index` aliases its parameter.
    pub fn is_mapped(&self, index: u32) -> bool {
        self.mapped.get(index as usize).copied().unwrap_or(false)
    }

    fn mapped_index(&self, key: &PropertyKey) -> Option<usize> {
        let index = key.as_index()?;
        self.is_mapped(index).then_some(index as usize)
    }

    fn unmap(&mut self, index: usize) {
        if let Some(flag) = self.mapped.get_mut(index) {
            *flag = false;
        }
    }
}

impl fmt::Debug for MappedArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedArguments")
            .field("mapped", &self.mapped)
            .finish()
    }
}

impl StoreOverrides for MappedArguments {
    fn kind_name(&self) -> &'static str {
        "arguments"
    }

    fn get_own_descriptor(&self, key: &PropertyKey) -> Option<Descriptor> {
        let index = self.mapped_index(key)?;
        let value = self.parameters.borrow().get(index).cloned()?;
        Some(Descriptor::value(key.clone(), value, Attributes::default()))
    }

    fn write(&mut self, key: &PropertyKey, value: &Value) -> SlotWrite {
        let Some(index) = self.mapped_index(key) else {
            return SlotWrite::Missing;
        };
        match self.parameters.borrow_mut().get_mut(index) {
            Some(cell) => {
                *cell = value.clone();
                SlotWrite::Written
            }
            None => SlotWrite::Missing,
        }
    }

    fn delete(&mut self, key: &PropertyKey) -> Option<bool> {
        let index = self.mapped_index(key)?;
        self.unmap(index);
        Some(true)
    }

    fn define_own_property(&mut self, desc: &Descriptor) -> Option<bool> {
        let index = self.mapped_index(desc.name())?;
        if let DescriptorKind::Value(value) = &desc.kind {
            if let Some(cell) = self.parameters.borrow_mut().get_mut(index) {
                *cell = value.clone();
            }
            if desc.attributes() == Attributes::default() {
                return Some(true);
            }
        }
        self.unmap(index);
        None
    }

    fn keys(&self) -> Vec<PropertyKey> {
        self.mapped
            .iter()
            .enumerate()
            .filter(|(_, mapped)| **mapped)
            .map(|(index, _)| PropertyKey::Index(index as u32))
            .collect()
    }
}

/// Function object exposing `length` and `name` without storing them.
///
/// Both are non-writable, non-enumerable and configurable. Deleting one or
/// defining it on the base retires the virtual copy.
#[derive(Debug)]
pub struct FunctionProperties {
    function: JsFunction,
    length_live: bool,
    name_live: bool,
}

impl FunctionProperties {
    /// Virtual properties of `function`.
    pub fn new(function: JsFunction) -> Self {
        FunctionProperties {
            function,
            length_live: true,
            name_live: true,
        }
    }

    /// The described function.
    pub fn function(&self) -> &JsFunction {
        &self.function
    }

    fn live_flag(&mut self, key: &PropertyKey) -> Option<&mut bool> {
        match key.as_str()? {
            "length" if self.length_live => Some(&mut self.length_live),
            "name" if self.name_live => Some(&mut self.name_live),
            _ => None,
        }
    }
}

impl StoreOverrides for FunctionProperties {
    fn kind_name(&self) -> &'static str {
        "function"
    }

    fn get_own_descriptor(&self, key: &PropertyKey) -> Option<Descriptor> {
        let value = match key.as_str()? {
            "length" if self.length_live => Value::Smi(self.function.arity() as i32),
            "name" if self.name_live => Value::string(self.function.name()),
            _ => return None,
        };
        Some(Descriptor::value(key.clone(), value, Attributes::read_only_hidden()))
    }

    fn write(&mut self, key: &PropertyKey, _value: &Value) -> SlotWrite {
        if self.has_own_property(key) {
            SlotWrite::ReadOnly
        } else {
            SlotWrite::Missing
        }
    }

    fn delete(&mut self, key: &PropertyKey) -> Option<bool> {
        let flag = self.live_flag(key)?;
        *flag = false;
        Some(true)
    }

    fn define_own_property(&mut self, desc: &Descriptor) -> Option<bool> {
        if let Some(flag) = self.live_flag(desc.name()) {
            *flag = false;
        }
        None
    }

    fn keys(&self) -> Vec<PropertyKey> {
        let mut keys = Vec::with_capacity(2);
        if self.length_live {
            keys.push(PropertyKey::from_name("length"));
        }
        if self.name_live {
            keys.push(PropertyKey::from_name("name"));
        }
        keys
    }
}
