//! Attribute-array-style containers.
//!
//! The host compiler attaches extensible per-node metadata through a fixed
//! registry mapping attribute types to slot indices, plus a sparse slot
//! array per node. Traversal unpacks one property per populated slot, named
//! by the registered type, in registration order.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::value::Value;

/// Registry of attribute types, in registration order.
#[derive(Default)]
pub struct AttrRegistry {
    names: Vec<&'static str>,
    index: FxHashMap<&'static str, usize>,
}

impl AttrRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attribute type, returning its slot index. Registering the
    /// same name again returns the existing slot.
    pub fn register(&mut self, name: &'static str) -> usize {
        if let Some(&slot) = self.index.get(name) {
            return slot;
        }
        let slot = self.names.len();
        self.names.push(name);
        self.index.insert(name, slot);
        slot
    }

    /// Slot index of a registered attribute type.
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Number of registered attribute types.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no attribute types are registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Registered names with their slots, in registration order.
    pub fn names(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.names.iter().copied().enumerate().map(|(i, n)| (n, i))
    }
}

/// Sparse attribute slots for one node, indexed by an [`AttrRegistry`].
pub struct AttrMap {
    registry: Rc<AttrRegistry>,
    slots: Vec<Option<Value>>,
}

impl AttrMap {
    /// Empty map sized to the registry.
    pub fn new(registry: Rc<AttrRegistry>) -> Self {
        let slots = vec![None; registry.len()];
        Self { registry, slots }
    }

    /// Populate a slot by attribute type name. Returns false for an
    /// unregistered name.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.registry.slot_of(name) {
            Some(slot) => {
                self.slots[slot] = Some(value);
                true
            }
            None => false,
        }
    }

    /// Value in the slot of an attribute type, if populated.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.registry
            .slot_of(name)
            .and_then(|slot| self.slots.get(slot))
            .and_then(|v| v.as_ref())
    }

    /// Populated entries cross-referenced against the registry, in
    /// registration order.
    pub fn entries(&self) -> Vec<(&'static str, Value)> {
        self.registry
            .names()
            .filter_map(|(name, slot)| {
                self.slots
                    .get(slot)
                    .and_then(|v| v.as_ref())
                    .map(|v| (name, v.clone()))
            })
            .collect()
    }

    /// Number of populated slots.
    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
