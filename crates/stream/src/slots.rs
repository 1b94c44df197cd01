use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use streamer_common::ItemId;

/// Per-participant handle through which the host protocol addresses a visible item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NativeSlot(pub u16);

impl std::fmt::Display for NativeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot {}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("slot table full (capacity {capacity})")]
    Capacity { capacity: usize },
    #[error("item {0} already holds a slot")]
    AlreadyAssigned(ItemId),
}

/// Attributes held alongside a slot and cleared with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAttributes {
    /// Weapon hits on this object are reported to scripts.
    pub shootable: bool,
}

/// Fixed-capacity slot table for one participant and one item type.
///
/// Always assigns the lowest free slot, so a released slot is the next one reused.
#[derive(Debug, Clone)]
pub struct SlotTable {
    occupants: Box<[Option<ItemId>]>,
    attributes: Box<[SlotAttributes]>,
    free: BTreeSet<u16>,
    by_item: BTreeMap<ItemId, NativeSlot>,
}

impl SlotTable {
    /// Capacities beyond the native slot range are clamped to it.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(u16::MAX as usize + 1);
        Self {
            occupants: vec![None; capacity].into_boxed_slice(),
            attributes: vec![SlotAttributes::default(); capacity].into_boxed_slice(),
            free: (0..capacity).map(|s| s as u16).collect(),
            by_item: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.occupants.len()
    }

    pub fn len(&self) -> usize {
        self.by_item.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_item.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    pub fn assign(&mut self, item: ItemId) -> Result<NativeSlot, SlotError> {
        if self.by_item.contains_key(&item) {
            return Err(SlotError::AlreadyAssigned(item));
        }
        let slot = self.free.pop_first().ok_or(SlotError::Capacity {
            capacity: self.capacity(),
        })?;
        self.occupants[slot as usize] = Some(item);
        self.by_item.insert(item, NativeSlot(slot));
        Ok(NativeSlot(slot))
    }

    /// Free a slot, returning its former occupant.
    pub fn release(&mut self, slot: NativeSlot) -> Option<ItemId> {
        let index = slot.0 as usize;
        let item = self.occupants.get_mut(index)?.take()?;
        self.attributes[index] = SlotAttributes::default();
        self.by_item.remove(&item);
        self.free.insert(slot.0);
        Some(item)
    }

    pub fn release_item(&mut self, item: ItemId) -> Option<NativeSlot> {
        let slot = *self.by_item.get(&item)?;
        self.release(slot);
        Some(slot)
    }

    pub fn slot_of(&self, item: ItemId) -> Option<NativeSlot> {
        self.by_item.get(&item).copied()
    }

    pub fn occupant(&self, slot: NativeSlot) -> Option<ItemId> {
        self.occupants.get(slot.0 as usize).copied().flatten()
    }

    /// Attributes of an occupied slot.
    pub fn attributes(&self, slot: NativeSlot) -> Option<SlotAttributes> {
        self.occupant(slot)?;
        self.attributes.get(slot.0 as usize).copied()
    }

    pub fn attributes_mut(&mut self, slot: NativeSlot) -> Option<&mut SlotAttributes> {
        self.occupant(slot)?;
        self.attributes.get_mut(slot.0 as usize)
    }

    /// Occupied slots in item id order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, NativeSlot)> + '_ {
        self.by_item.iter().map(|(item, slot)| (*item, *slot))
    }

    /// Release every slot, returning what was held.
    pub fn clear(&mut self) -> Vec<(ItemId, NativeSlot)> {
        let held: Vec<_> = self.iter().collect();
        for (_, slot) in &held {
            self.release(*slot);
        }
        held
    }
}
