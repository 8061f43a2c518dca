//! Shape (hidden class) system for property slot resolution.
//!
//! Objects that receive the same sequence of property definitions share a
//! shape. A shape is an immutable node in a transition tree: it knows its
//! parent and the single transition that produced it, so resolving a key is a
//! walk up the parent chain. Deep chains get a flattened key→slot table,
//! built off the access path by the [`ShapeFlattener`].
//!
//! ```text
//!        root
//!         |
//!      +"x" (slot 0)
//!         |
//!      +"y" (slot 1)
//!       /      \
//!   -"x"      +"z" (slot 2)
//!  (hole 0)
//! ```
//!
//! Deletion and attribute changes are transitions too (`Remove`,
//! `Reconfigure`). They never renumber slots: a removed key leaves a hole.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use core_types::{Attributes, PropertyKey};
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::flatten::ShapeFlattener;

/// Unique identifier for a shape.
///
/// Ids are handed out from a monotonically increasing counter and never
/// reused, so caches compare them by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ShapeId(u64);

impl ShapeId {
    /// Id of the root (empty) shape.
    pub const ROOT: Self = ShapeId(0);

    /// Get raw value.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

static NEXT_SHAPE_ID: AtomicU64 = AtomicU64::new(1);

static ROOT_SHAPE: Lazy<Arc<Shape>> = Lazy::new(|| {
    Arc::new(Shape {
        id: ShapeId::ROOT,
        parent: None,
        transition: None,
        slot: None,
        slot_count: 0,
        property_count: 0,
        depth: 0,
        mutation_count: 0,
        children: Mutex::new(FxHashMap::default()),
        table: OnceCell::new(),
        flatten_requested: AtomicBool::new(false),
    })
});

/// The single change that derives a child shape from its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Transition {
    /// A new property in the next free slot.
    Add {
        /// Property name
        key: PropertyKey,
        /// Attributes of the new property
        attributes: Attributes,
    },
    /// Same slot, new attributes.
    Reconfigure {
        /// Property name
        key: PropertyKey,
        /// Replacement attributes
        attributes: Attributes,
    },
    /// The property is gone; its slot becomes a hole.
    Remove {
        /// Property name
        key: PropertyKey,
    },
}

impl Transition {
    /// Key touched by this transition.
    pub fn key(&self) -> &PropertyKey {
        match self {
            Transition::Add { key, .. }
            | Transition::Reconfigure { key, .. }
            | Transition::Remove { key } => key,
        }
    }

    /// True for transitions other than `Add`.
    pub fn is_non_append(&self) -> bool {
        !matches!(self, Transition::Add { .. })
    }
}

/// Where a property lives and how it behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotInfo {
    /// Slot index, stable for the lifetime of the shape.
    pub slot: u32,
    /// Property attributes.
    pub attributes: Attributes,
}

/// Keyed overrides of one table layer; `None` marks a removed key.
type Layer = FxHashMap<PropertyKey, Option<SlotInfo>>;

/// Flattened key→slot table of one shape.
///
/// Stored as a stack of shared layers, newest last, each less than half the
/// size of the one below it. A child shape's table reuses its parent's layers
/// and adds its own transition on top, merging the top layers only when the
/// size invariant breaks. A chain of `n` flattened shapes therefore holds
/// `O(n log n)` entries in total and a lookup checks `O(log n)` layers.
#[derive(Debug, Clone, Default)]
pub struct FlatTable {
    layers: Vec<Arc<Layer>>,
    len: usize,
}

impl FlatTable {
    fn apply(&mut self, transition: &Transition, slot: Option<u32>) {
        let (key, entry) = match transition {
            Transition::Add { key, attributes } => {
                let Some(slot) = slot else { return };
                self.len += 1;
                let info = SlotInfo {
                    slot,
                    attributes: *attributes,
                };
                (key, Some(info))
            }
            Transition::Reconfigure { key, attributes } => {
                let Some(info) = self.lookup(key) else { return };
                let info = SlotInfo {
                    slot: info.slot,
                    attributes: *attributes,
                };
                (key, Some(info))
            }
            Transition::Remove { key } => {
                if self.lookup(key).is_none() {
                    return;
                }
                self.len -= 1;
                (key, None)
            }
        };

        let mut layer = Layer::default();
        layer.insert(key.clone(), entry);
        self.layers.push(Arc::new(layer));
        self.compact();
    }

    fn compact(&mut self) {
        while let [.., older, newer] = self.layers.as_slice() {
            if newer.len() * 2 < older.len() {
                break;
            }
            let mut merged = Layer::clone(older);
            merged.extend(newer.iter().map(|(key, entry)| (key.clone(), *entry)));
            self.layers.truncate(self.layers.len() - 2);
            if self.layers.is_empty() {
                merged.retain(|_, entry| entry.is_some());
            }
            self.layers.push(Arc::new(merged));
        }
    }

    /// Resolve a key.
    #[inline]
    pub fn lookup(&self, key: &PropertyKey) -> Option<SlotInfo> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.get(key))
            .copied()
            .flatten()
    }

    /// Live keys with their slots, in insertion order.
    ///
    /// Slots are handed out in insertion order and a reconfigured property
    /// keeps its slot, so sorting by slot restores the order.
    pub fn entries(&self) -> Vec<(PropertyKey, SlotInfo)> {
        let mut seen: FxHashSet<&PropertyKey> = FxHashSet::default();
        let mut live = Vec::with_capacity(self.len);
        for layer in self.layers.iter().rev() {
            for (key, entry) in layer.iter() {
                if seen.insert(key) {
                    if let Some(info) = entry {
                        live.push((key.clone(), *info));
                    }
                }
            }
        }
        live.sort_by_key(|(_, info)| info.slot);
        live
    }

    /// Live keys in insertion order.
    pub fn keys(&self) -> Vec<PropertyKey> {
        self.entries().into_iter().map(|(key, _)| key).collect()
    }

    /// Number of live properties.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the table holds no property.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Layers currently stacked.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Entries held by layers not shared with `base`.
    pub fn unshared_entries(&self, base: &FlatTable) -> usize {
        self.layers
            .iter()
            .filter(|layer| !base.layers.iter().any(|other| Arc::ptr_eq(layer, other)))
            .map(|layer| layer.len())
            .sum()
    }
}

impl PartialEq for FlatTable {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.entries() == other.entries()
    }
}

impl Eq for FlatTable {}

/// Immutable description of an object's property layout.
///
/// # Example
///
/// ```
/// use core_types::{Attributes, PropertyKey};
/// use object_model::Shape;
///
/// let x = PropertyKey::from_name("x");
/// let y = PropertyKey::from_name("y");
///
/// let shape = Shape::root()
///     .add_property(x.clone(), Attributes::default())
///     .add_property(y.clone(), Attributes::default());
///
/// assert_eq!(shape.lookup(&x).map(|info| info.slot), Some(0));
/// assert_eq!(shape.lookup(&y).map(|info| info.slot), Some(1));
/// ```
pub struct Shape {
    id: ShapeId,
    parent: Option<Arc<Shape>>,
    transition: Option<Transition>,
    /// Slot touched by `transition`.
    slot: Option<u32>,
    slot_count: u32,
    property_count: u32,
    depth: u32,
    mutation_count: u32,
    /// Children are weak so unused branches of the tree are reclaimed.
    children: Mutex<FxHashMap<Transition, Weak<Shape>>>,
    /// Published once; readers either see nothing or the finished table.
    table: OnceCell<FlatTable>,
    flatten_requested: AtomicBool,
}

impl Shape {
    /// The empty shape every object starts from.
    pub fn root() -> Arc<Shape> {
        Arc::clone(&ROOT_SHAPE)
    }

    /// Derive (or reuse) the child shape for `transition`.
    ///
    /// Identical transitions from the same parent return the same child for
    /// as long as that child is alive.
    pub fn transition(self: &Arc<Self>, transition: Transition) -> Arc<Shape> {
        let mut children = self.children.lock();
        if let Some(existing) = children.get(&transition).and_then(Weak::upgrade) {
            return existing;
        }

        let child = Arc::new(self.derive(transition.clone()));
        children.insert(transition, Arc::downgrade(&child));
        child
    }

    /// Transition adding `key` in the next free slot.
    pub fn add_property(self: &Arc<Self>, key: PropertyKey, attributes: Attributes) -> Arc<Shape> {
        debug_assert!(self.resolve(&key).is_none(), "{:?} already present", key);
        self.transition(Transition::Add { key, attributes })
    }

    /// Transition removing `key`, leaving a hole in its slot.
    pub fn remove_property(self: &Arc<Self>, key: PropertyKey) -> Arc<Shape> {
        debug_assert!(self.resolve(&key).is_some(), "{:?} not present", key);
        self.transition(Transition::Remove { key })
    }

    /// Transition changing the attributes of `key` in place.
    pub fn reconfigure_property(
        self: &Arc<Self>,
        key: PropertyKey,
        attributes: Attributes,
    ) -> Arc<Shape> {
        debug_assert!(self.resolve(&key).is_some(), "{:?} not present", key);
        self.transition(Transition::Reconfigure { key, attributes })
    }

    fn derive(self: &Arc<Self>, transition: Transition) -> Shape {
        let (slot, slot_count, property_count) = match &transition {
            Transition::Add { .. } => (
                Some(self.slot_count),
                self.slot_count + 1,
                self.property_count + 1,
            ),
            Transition::Reconfigure { key, .. } => (
                self.resolve(key).map(|info| info.slot),
                self.slot_count,
                self.property_count,
            ),
            Transition::Remove { key } => (
                self.resolve(key).map(|info| info.slot),
                self.slot_count,
                self.property_count.saturating_sub(1),
            ),
        };
        let mutation_count = self.mutation_count + u32::from(transition.is_non_append());

        Shape {
            id: ShapeId(NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed)),
            parent: Some(Arc::clone(self)),
            transition: Some(transition),
            slot,
            slot_count,
            property_count,
            depth: self.depth + 1,
            mutation_count,
            children: Mutex::new(FxHashMap::default()),
            table: OnceCell::new(),
            flatten_requested: AtomicBool::new(false),
        }
    }

    /// Resolve `key` to its slot and attributes.
    ///
    /// Uses the flattened table when installed; otherwise walks the parent
    /// chain and, for deep shapes, asks the flattener to build a table.
    pub fn lookup(self: &Arc<Self>, key: &PropertyKey) -> Option<SlotInfo> {
        if let Some(table) = self.table.get() {
            return table.lookup(key);
        }
        if !self.flatten_requested.load(Ordering::Relaxed)
            && self.depth >= ShapeFlattener::global().min_depth()
        {
            self.request_flatten();
        }
        self.resolve(key)
    }

    /// Parent-chain walk. Stops early at the first ancestor that already has
    /// a table.
    fn resolve(&self, key: &PropertyKey) -> Option<SlotInfo> {
        let mut current = self;
        loop {
            if let Some(table) = current.table.get() {
                return table.lookup(key);
            }
            if let Some(transition) = &current.transition {
                if transition.key() == key {
                    return match transition {
                        Transition::Remove { .. } => None,
                        Transition::Add { attributes, .. }
                        | Transition::Reconfigure { attributes, .. } => {
                            current.slot.map(|slot| SlotInfo {
                                slot,
                                attributes: *attributes,
                            })
                        }
                    };
                }
            }
            match &current.parent {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    /// Queue this shape for background flattening (once).
    pub fn request_flatten(self: &Arc<Self>) {
        if self.table.get().is_some() || self.flatten_requested.swap(true, Ordering::AcqRel) {
            return;
        }
        ShapeFlattener::global().request(Arc::clone(self));
    }

    /// Build and install the flattened table, returning it.
    ///
    /// Idempotent: a second call returns the already-installed table, and two
    /// racing calls install exactly one of two identical tables.
    pub fn flatten(&self) -> &FlatTable {
        self.table.get_or_init(|| self.build_table())
    }

    /// Flatten this shape and every unflattened ancestor, root first.
    ///
    /// Returns how many tables were installed by this call.
    pub fn flatten_with_ancestors(&self) -> usize {
        let mut pending: Vec<&Shape> = Vec::new();
        let mut current = Some(self);
        while let Some(shape) = current {
            if shape.is_flattened() {
                break;
            }
            pending.push(shape);
            current = shape.parent.as_deref();
        }

        let mut installed = 0;
        for shape in pending.into_iter().rev() {
            if !shape.is_flattened() {
                shape.flatten();
                installed += 1;
            }
        }
        installed
    }

    fn build_table(&self) -> FlatTable {
        let mut chain: Vec<&Shape> = Vec::with_capacity(self.depth as usize);
        let mut table = FlatTable::default();
        let mut current = Some(self);
        while let Some(shape) = current {
            if let Some(ancestor) = shape.table.get() {
                table = ancestor.clone();
                break;
            }
            chain.push(shape);
            current = shape.parent.as_deref();
        }

        for shape in chain.into_iter().rev() {
            if let Some(transition) = &shape.transition {
                table.apply(transition, shape.slot);
            }
        }
        table
    }

    /// Live keys in insertion order.
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        match self.table.get() {
            Some(table) => table.keys(),
            None => self.build_table().keys(),
        }
    }

    /// The installed table, if flattening has completed.
    pub fn flat_table(&self) -> Option<&FlatTable> {
        self.table.get()
    }

    /// True once a flattened table is installed.
    #[inline]
    pub fn is_flattened(&self) -> bool {
        self.table.get().is_some()
    }

    /// Get the shape ID.
    #[inline]
    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Get the parent shape.
    #[inline]
    pub fn parent(&self) -> Option<&Arc<Shape>> {
        self.parent.as_ref()
    }

    /// Transition that produced this shape (`None` for the root).
    #[inline]
    pub fn last_transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    /// Distance from the root.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Slots allocated so far, holes included.
    #[inline]
    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    /// Live properties.
    #[inline]
    pub fn property_count(&self) -> u32 {
        self.property_count
    }

    /// `Remove` and `Reconfigure` transitions on the chain.
    #[inline]
    pub fn mutation_count(&self) -> u32 {
        self.mutation_count
    }

    /// True for the empty root shape.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.id == ShapeId::ROOT
    }
}

impl Drop for Shape {
    fn drop(&mut self) {
        // Unlink uniquely owned ancestors one at a time instead of recursing
        // through the whole chain.
        let mut parent = self.parent.take();
        while let Some(shape) = parent {
            parent = match Arc::try_unwrap(shape) {
                Ok(mut unique) => unique.parent.take(),
                Err(_) => None,
            };
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("id", &self.id)
            .field("transition", &self.transition)
            .field("depth", &self.depth)
            .field("property_count", &self.property_count)
            .field("flattened", &self.is_flattened())
            .finish()
    }
}
