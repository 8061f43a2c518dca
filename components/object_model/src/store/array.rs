//! Dense index storage for array-like objects.

use core_types::{Attributes, PropertyKey};

use super::{Degrade, DictionaryStore, SlotRead, SlotWrite, StoreId};
use crate::config::StorePolicy;
use crate::descriptor::{Descriptor, DescriptorKind};
use crate::value::Value;

/// Index-keyed elements plus a dictionary for everything else.
///
/// Elements always carry default attributes and plain data. Anything else
/// (an accessor on an index, a read-only element, a write that would leave
/// the vector mostly holes) is reported as [`Degrade`] so the owning
/// [`PropertyStore`](super::PropertyStore) can switch to a dictionary.
#[derive(Debug)]
pub struct ArrayStore {
    id: StoreId,
    policy: StorePolicy,
    elements: Vec<Option<Value>>,
    occupied: usize,
    named: DictionaryStore,
}

impl ArrayStore {
    /// Empty array store.
    pub fn new(policy: StorePolicy) -> Self {
        Self::from_values(Vec::new(), policy)
    }

    /// Array store holding `values` at indices `0..values.len()`.
    pub fn from_values(values: Vec<Value>, policy: StorePolicy) -> Self {
        let occupied = values.len();
        ArrayStore {
            id: StoreId::next(),
            policy,
            elements: values.into_iter().map(Some).collect(),
            occupied,
            named: DictionaryStore::new(policy),
        }
    }

    /// Identity of this store instance.
    #[inline]
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Element slots, holes included.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True if no element slot exists.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element slots holding a value.
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    /// Element at `index`.
    #[inline]
    pub fn get_index(&self, index: u32) -> Option<Value> {
        self.elements.get(index as usize).cloned().flatten()
    }

    /// Overwrites an existing element. False for holes and out-of-range
    /// indices; those go through [`ArrayStore::define_own_property`].
    #[inline]
    pub fn set_index(&mut self, index: u32, value: Value) -> bool {
        match self.elements.get_mut(index as usize) {
            Some(Some(slot)) => {
                *slot = value;
                true
            }
            _ => false,
        }
    }

    /// True if `key` is an own property.
    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        match key.as_index() {
            Some(index) => matches!(self.elements.get(index as usize), Some(Some(_))),
            None => self.named.has_own_property(key),
        }
    }

    /// Snapshot of the own property `key`.
    pub fn get_own_descriptor(&self, key: &PropertyKey) -> Option<Descriptor> {
        match key.as_index() {
            Some(index) => self
                .get_index(index)
                .map(|value| Descriptor::value(key.clone(), value, Attributes::default())),
            None => self.named.get_own_descriptor(key),
        }
    }

    /// Read phase.
    pub fn read(&self, key: &PropertyKey) -> SlotRead {
        match key.as_index() {
            Some(index) => match self.get_index(index) {
                Some(value) => SlotRead::Data(value),
                None => SlotRead::Missing,
            },
            None => self.named.read(key),
        }
    }

    /// Write phase for an existing property.
    pub fn write(&mut self, key: &PropertyKey, value: &Value) -> SlotWrite {
        match key.as_index() {
            Some(index) => {
                if self.set_index(index, value.clone()) {
                    SlotWrite::Written
                } else {
                    SlotWrite::Missing
                }
            }
            None => self.named.write(key, value),
        }
    }

    pub(crate) fn delete(&mut self, key: &PropertyKey) -> Result<bool, Degrade> {
        let Some(index) = key.as_index() else {
            return Ok(self.named.delete(key));
        };
        let index = index as usize;
        if !matches!(self.elements.get(index), Some(Some(_))) {
            return Ok(true);
        }
        if self.policy.is_sparse(self.elements.len(), self.occupied - 1) {
            return Err(Degrade);
        }
        self.elements[index] = None;
        self.occupied -= 1;
        Ok(true)
    }

    pub(crate) fn define_own_property(&mut self, desc: Descriptor) -> Result<bool, (Degrade, Descriptor)> {
        let Some(index) = desc.name().as_index() else {
            return Ok(self.named.define_own_property(desc));
        };
        if desc.attributes() != Attributes::default() || !desc.kind.is_data() {
            return Err((Degrade, desc));
        }

        let index = index as usize;
        let present = matches!(self.elements.get(index), Some(Some(_)));
        let len = self.elements.len().max(index + 1);
        let occupied = if present { self.occupied } else { self.occupied + 1 };
        if self.policy.is_sparse(len, occupied) {
            return Err((Degrade, desc));
        }

        let (_, _, kind) = desc.into_parts();
        let DescriptorKind::Value(value) = kind else {
            return Ok(false);
        };
        if index >= self.elements.len() {
            self.elements.resize(index + 1, None);
        }
        self.elements[index] = Some(value);
        self.occupied = occupied;
        Ok(true)
    }

    /// Own keys: occupied indices ascending, then named keys.
    pub fn keys(&self) -> Vec<PropertyKey> {
        let mut keys: Vec<PropertyKey> = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| PropertyKey::Index(index as u32))
            .collect();
        keys.extend(self.named.keys());
        keys
    }

    /// Equivalent dictionary store with a fresh id.
    pub(crate) fn into_dictionary(self) -> DictionaryStore {
        let mut dictionary = DictionaryStore::new(self.policy);
        for (index, slot) in self.elements.into_iter().enumerate() {
            if let Some(value) = slot {
                let key = PropertyKey::Index(index as u32);
                dictionary.define_own_property(Descriptor::value(key, value, Attributes::default()));
            }
        }
        for key in self.named.keys() {
            if let Some(desc) = self.named.get_own_descriptor(&key) {
                dictionary.define_own_property(desc);
            }
        }
        dictionary
    }
}
