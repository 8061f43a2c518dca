//! Slot-indexed storage.
//!
//! No name resolution happens here: callers arrive with a slot index already
//! resolved through a shape lookup or an inline cache.

use crate::descriptor::DescriptorKind;
use crate::value::Value;

/// Slot vector of a shaped object. `None` marks a hole left by a deletion.
#[derive(Debug, Clone, Default)]
pub struct FastStore {
    slots: Vec<Option<DescriptorKind>>,
}

impl FastStore {
    /// Empty slot vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload in `slot`, if any.
    #[inline]
    pub fn get(&self, slot: u32) -> Option<&DescriptorKind> {
        self.slots.get(slot as usize).and_then(Option::as_ref)
    }

    /// Mutable payload in `slot`, if any.
    #[inline]
    pub fn get_mut(&mut self, slot: u32) -> Option<&mut DescriptorKind> {
        self.slots.get_mut(slot as usize).and_then(Option::as_mut)
    }

    /// Value of a data property in `slot`.
    #[inline]
    pub fn read_value(&self, slot: u32) -> Option<Value> {
        self.get(slot).and_then(DescriptorKind::data).cloned()
    }

    /// Overwrites the data property in `slot`.
    ///
    /// Returns false if the slot is a hole or holds a non-data property. The
    /// caller is responsible for having checked writability via the shape.
    #[inline]
    pub fn write_value(&mut self, slot: u32, value: Value) -> bool {
        match self.get_mut(slot) {
            Some(DescriptorKind::Value(stored)) => {
                *stored = value;
                true
            }
            _ => false,
        }
    }

    /// Stores `kind` in `slot`, growing the vector as needed.
    pub fn put(&mut self, slot: u32, kind: DescriptorKind) {
        let index = slot as usize;
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(kind);
    }

    /// Turns `slot` into a hole, returning what it held.
    pub fn clear(&mut self, slot: u32) -> Option<DescriptorKind> {
        self.slots.get_mut(slot as usize).and_then(Option::take)
    }

    /// Slots allocated, holes included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no slot was ever allocated.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots holding a property.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
