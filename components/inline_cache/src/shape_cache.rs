//! Shape-keyed caching for named property access sites.
//!
//! A [`ShapeSlot`] remembers, per shape it has seen, which fast slot holds
//! its property. It starts empty, keeps up to
//! [`MAX_POLYMORPHIC_ENTRIES`] shapes and then stops caching for good.

use arrayvec::ArrayVec;
use core_types::{JsResult, PropertyKey, Strictness};
use object_model::{ObjectRef, ShapeId, Value};

use crate::boxes::BoxStats;

/// Shapes a site remembers before it gives up.
pub const MAX_POLYMORPHIC_ENTRIES: usize = 4;

/// What a site has learned so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteState {
    /// Nothing learned yet.
    Uninitialized,
    /// One shape.
    Monomorphic,
    /// Two to [`MAX_POLYMORPHIC_ENTRIES`] shapes.
    Polymorphic,
    /// Too many shapes; every access takes the general path.
    Megamorphic,
}

#[derive(Debug, Clone, Copy)]
struct Learned {
    shape: ShapeId,
    slot: u32,
}

/// Access site for one named property.
///
/// A hit requires the object's current shape to be one the site learned;
/// the slot is then read or written directly in the fast store. Only
/// writable data properties are learned, so a learned slot can always be
/// written.
#[derive(Debug)]
pub struct ShapeSlot {
    key: PropertyKey,
    learned: ArrayVec<Learned, MAX_POLYMORPHIC_ENTRIES>,
    megamorphic: bool,
    stats: BoxStats,
}

impl ShapeSlot {
    /// Site for `key`.
    pub fn new(key: PropertyKey) -> Self {
        ShapeSlot {
            key,
            learned: ArrayVec::new(),
            megamorphic: false,
            stats: BoxStats::default(),
        }
    }

    /// The property this site accesses.
    pub fn key(&self) -> &PropertyKey {
        &self.key
    }

    /// Learning progress.
    pub fn state(&self) -> SiteState {
        if self.megamorphic {
            return SiteState::Megamorphic;
        }
        match self.learned.len() {
            0 => SiteState::Uninitialized,
            1 => SiteState::Monomorphic,
            _ => SiteState::Polymorphic,
        }
    }

    /// Number of shapes currently served by the fast path.
    pub fn cached_shapes(&self) -> usize {
        self.learned.len()
    }

    /// Hit/fallback counters.
    pub fn stats(&self) -> &BoxStats {
        &self.stats
    }

    fn slot_for(&self, shape: ShapeId) -> Option<u32> {
        self.learned
            .iter()
            .find(|entry| entry.shape == shape)
            .map(|entry| entry.slot)
    }

    fn remember(&mut self, shape: ShapeId, slot: u32) {
        if self.megamorphic {
            return;
        }
        if let Some(entry) = self.learned.iter_mut().find(|entry| entry.shape == shape) {
            entry.slot = slot;
            return;
        }
        if self.learned.try_push(Learned { shape, slot }).is_err() {
            tracing::debug!(key = %self.key, shapes = self.learned.len(), "property site went megamorphic");
            self.learned.clear();
            self.megamorphic = true;
        }
    }

    /// `obj[key]`.
    pub fn get(&mut self, obj: &ObjectRef) -> JsResult<Value> {
        let hit = obj.with_store(|store| {
            let slot = self.slot_for(store.shape()?.id())?;
            store.fast()?.read_value(slot)
        });
        if let Some(value) = hit {
            self.stats.record_hit();
            return Ok(value);
        }

        self.stats.record_fallback();
        tracing::trace!(key = %self.key, "shape slot miss on get");
        self.learn(obj);
        obj.get(&self.key)
    }

    /// `obj[key] = value`.
    pub fn set(&mut self, obj: &ObjectRef, value: Value, strictness: Strictness) -> JsResult<bool> {
        let written = obj.with_store_mut(|store| {
            let slot = self.slot_for(store.shape()?.id())?;
            store.fast_mut()?.write_value(slot, value.clone()).then_some(())
        });
        if written.is_some() {
            self.stats.record_hit();
            return Ok(true);
        }

        self.stats.record_fallback();
        tracing::trace!(key = %self.key, "shape slot miss on set");
        let result = obj.put(self.key.clone(), value, strictness)?;
        self.learn(obj);
        Ok(result)
    }

    fn learn(&mut self, obj: &ObjectRef) {
        if self.megamorphic {
            return;
        }
        let key = &self.key;
        let learned = obj.with_store(|store| {
            let shape = store.shape()?;
            let info = shape.lookup(key)?;
            if !info.attributes.is_writable() {
                return None;
            }
            let is_data = store.fast()?.get(info.slot)?.is_data();
            is_data.then_some((shape.id(), info.slot))
        });
        if let Some((shape, slot)) = learned {
            self.remember(shape, slot);
        }
    }
}
