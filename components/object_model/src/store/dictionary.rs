//! General keyed storage.
//!
//! A dictionary store starts shape-backed: the shape maps keys to slots and
//! a [`FastStore`] holds the payloads. Deleting or reconfiguring a property
//! takes a non-append transition. Once the shape chain has accumulated
//! `deletion_threshold` of those, the store moves its properties into a plain
//! hash map and never goes back to shapes.

use std::sync::Arc;

use core_types::{Attributes, PropertyKey};
use rustc_hash::FxHashMap;

use super::{can_redefine, order_keys, read_kind, write_kind, FastStore, SlotRead, SlotWrite, StoreId};
use crate::config::StorePolicy;
use crate::descriptor::{Descriptor, DescriptorKind};
use crate::shape::Shape;
use crate::value::Value;

#[derive(Debug)]
enum Layout {
    Shaped {
        shape: Arc<Shape>,
        slots: FastStore,
    },
    Unshaped {
        map: FxHashMap<PropertyKey, (Attributes, DescriptorKind)>,
        /// Insertion order of the keys in `map`.
        order: Vec<PropertyKey>,
    },
}

/// Name/index-keyed property storage.
#[derive(Debug)]
pub struct DictionaryStore {
    id: StoreId,
    policy: StorePolicy,
    layout: Layout,
}

impl DictionaryStore {
    /// Empty store on the root shape.
    pub fn new(policy: StorePolicy) -> Self {
        DictionaryStore {
            id: StoreId::next(),
            policy,
            layout: Layout::Shaped {
                shape: Shape::root(),
                slots: FastStore::new(),
            },
        }
    }

    /// Identity of this store instance.
    #[inline]
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Thresholds in effect.
    pub fn policy(&self) -> StorePolicy {
        self.policy
    }

    /// Current shape, `None` once shapes were abandoned.
    #[inline]
    pub fn shape(&self) -> Option<&Arc<Shape>> {
        match &self.layout {
            Layout::Shaped { shape, .. } => Some(shape),
            Layout::Unshaped { .. } => None,
        }
    }

    /// Slot storage, `None` once shapes were abandoned.
    #[inline]
    pub fn fast(&self) -> Option<&FastStore> {
        match &self.layout {
            Layout::Shaped { slots, .. } => Some(slots),
            Layout::Unshaped { .. } => None,
        }
    }

    /// Mutable slot storage, `None` once shapes were abandoned.
    #[inline]
    pub fn fast_mut(&mut self) -> Option<&mut FastStore> {
        match &mut self.layout {
            Layout::Shaped { slots, .. } => Some(slots),
            Layout::Unshaped { .. } => None,
        }
    }

    /// True while the store is shape-backed.
    pub fn is_shaped(&self) -> bool {
        matches!(self.layout, Layout::Shaped { .. })
    }

    /// Number of own properties.
    pub fn len(&self) -> usize {
        match &self.layout {
            Layout::Shaped { shape, .. } => shape.property_count() as usize,
            Layout::Unshaped { map, .. } => map.len(),
        }
    }

    /// True if the store has no properties.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `key` is an own property.
    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        match &self.layout {
            Layout::Shaped { shape, .. } => shape.lookup(key).is_some(),
            Layout::Unshaped { map, .. } => map.contains_key(key),
        }
    }

    /// Snapshot of the own property `key`.
    pub fn get_own_descriptor(&self, key: &PropertyKey) -> Option<Descriptor> {
        match &self.layout {
            Layout::Shaped { shape, slots } => {
                let info = shape.lookup(key)?;
                let kind = slots.get(info.slot)?.clone();
                Some(Descriptor::new(key.clone(), info.attributes, kind))
            }
            Layout::Unshaped { map, .. } => {
                let (attributes, kind) = map.get(key)?;
                Some(Descriptor::new(key.clone(), *attributes, kind.clone()))
            }
        }
    }

    /// Read phase.
    pub fn read(&self, key: &PropertyKey) -> SlotRead {
        match &self.layout {
            Layout::Shaped { shape, slots } => {
                match shape.lookup(key).and_then(|info| Some((info, slots.get(info.slot)?))) {
                    Some((info, kind)) => read_kind(key, info.attributes, kind),
                    None => SlotRead::Missing,
                }
            }
            Layout::Unshaped { map, .. } => match map.get(key) {
                Some((attributes, kind)) => read_kind(key, *attributes, kind),
                None => SlotRead::Missing,
            },
        }
    }

    /// Write phase for an existing property.
    pub fn write(&mut self, key: &PropertyKey, value: &Value) -> SlotWrite {
        match &mut self.layout {
            Layout::Shaped { shape, slots } => {
                let Some(info) = shape.lookup(key) else {
                    return SlotWrite::Missing;
                };
                match slots.get_mut(info.slot) {
                    Some(kind) => write_kind(key, info.attributes, kind, value),
                    None => SlotWrite::Missing,
                }
            }
            Layout::Unshaped { map, .. } => match map.get_mut(key) {
                Some((attributes, kind)) => write_kind(key, *attributes, kind, value),
                None => SlotWrite::Missing,
            },
        }
    }

    /// Removes `key`. True if removed or absent, false if not configurable.
    pub fn delete(&mut self, key: &PropertyKey) -> bool {
        let crosses_threshold = match &self.layout {
            Layout::Shaped { shape, .. } => match shape.lookup(key) {
                None => return true,
                Some(info) if !info.attributes.is_configurable() => return false,
                Some(_) => self.crosses_threshold(shape),
            },
            Layout::Unshaped { map, .. } => match map.get(key) {
                None => return true,
                Some((attributes, _)) if !attributes.is_configurable() => return false,
                Some(_) => false,
            },
        };
        if crosses_threshold {
            self.abandon_shapes();
        }

        match &mut self.layout {
            Layout::Shaped { shape, slots } => {
                if let Some(info) = shape.lookup(key) {
                    *shape = shape.remove_property(key.clone());
                    slots.clear(info.slot);
                }
            }
            Layout::Unshaped { map, order } => {
                if map.remove(key).is_some() {
                    order.retain(|k| k != key);
                }
            }
        }
        true
    }

    /// Installs or replaces an own property.
    ///
    /// A new key takes an `Add` transition; an attribute change on an
    /// existing key takes a `Reconfigure` transition; a payload-only change
    /// rewrites the slot in place.
    pub fn define_own_property(&mut self, desc: Descriptor) -> bool {
        let needs_reconfigure = match &self.layout {
            Layout::Shaped { shape, slots } => match shape.lookup(desc.name()) {
                Some(info) => {
                    let allowed = slots
                        .get(info.slot)
                        .map_or(true, |kind| can_redefine(info.attributes, kind, &desc));
                    if !allowed {
                        return false;
                    }
                    info.attributes != desc.attributes()
                }
                None => false,
            },
            Layout::Unshaped { map, .. } => match map.get(desc.name()) {
                Some((attributes, kind)) if !can_redefine(*attributes, kind, &desc) => {
                    return false;
                }
                _ => false,
            },
        };
        if needs_reconfigure {
            if let Some(shape) = self.shape() {
                if self.crosses_threshold(shape) {
                    self.abandon_shapes();
                }
            }
        }

        let (key, attributes, kind) = desc.into_parts();
        match &mut self.layout {
            Layout::Shaped { shape, slots } => match shape.lookup(&key) {
                Some(info) => {
                    if info.attributes != attributes {
                        *shape = shape.reconfigure_property(key, attributes);
                    }
                    slots.put(info.slot, kind);
                }
                None => {
                    *shape = shape.add_property(key, attributes);
                    slots.put(shape.slot_count() - 1, kind);
                }
            },
            Layout::Unshaped { map, order } => {
                if map.insert(key.clone(), (attributes, kind)).is_none() {
                    order.push(key);
                }
            }
        }
        true
    }

    /// Own keys: index keys ascending, then string keys in insertion order.
    pub fn keys(&self) -> Vec<PropertyKey> {
        match &self.layout {
            Layout::Shaped { shape, .. } => order_keys(shape.own_keys()),
            Layout::Unshaped { order, .. } => order_keys(order.iter().cloned()),
        }
    }

    fn crosses_threshold(&self, shape: &Shape) -> bool {
        shape.mutation_count() + 1 >= self.policy.deletion_threshold
    }

    /// Moves every property into the hash map. Permanent.
    fn abandon_shapes(&mut self) {
        let Layout::Shaped { shape, slots } = &mut self.layout else {
            return;
        };

        let keys = shape.own_keys();
        let mut map = FxHashMap::default();
        map.reserve(keys.len());
        for key in &keys {
            if let Some(info) = shape.lookup(key) {
                if let Some(kind) = slots.clear(info.slot) {
                    map.insert(key.clone(), (info.attributes, kind));
                }
            }
        }

        let old_shape = shape.id();
        self.layout = Layout::Unshaped { map, order: keys };
        self.id = StoreId::next();
        tracing::debug!(
            store = self.id.raw(),
            shape = old_shape.raw(),
            "dictionary store abandoned shape-based storage"
        );
    }
}
