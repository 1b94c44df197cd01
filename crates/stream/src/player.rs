use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use streamer_common::{ItemId, ItemKey, ItemType, PlayerId, StreamerConfig};

use crate::slots::{NativeSlot, SlotTable};

/// Per-(participant, checkpoint) state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckpointState {
    Invisible,
    Visible,
    /// The participant is confirmed to be standing in it.
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionKind {
    Edit,
    Select,
}

/// An object a participant is editing or selecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInteraction {
    pub object: ItemId,
    pub kind: InteractionKind,
    /// Whether starting the interaction pinned the object, and so ending it must unpin.
    pub pinned: bool,
}

/// Everything the streamer tracks about one connected participant.
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub(crate) id: PlayerId,
    pub(crate) position: Vec3,
    pub(crate) world: i32,
    pub(crate) interior: i32,
    pub(crate) spectating: bool,
    pub(crate) slots: BTreeMap<ItemType, SlotTable>,
    pub(crate) areas: BTreeSet<ItemId>,
    pub(crate) active_checkpoints: BTreeMap<ItemType, ItemId>,
    pub(crate) interaction: Option<ObjectInteraction>,
}

impl PlayerState {
    pub(crate) fn new(id: PlayerId, position: Vec3, config: &StreamerConfig) -> Self {
        Self {
            id,
            position,
            world: 0,
            interior: 0,
            spectating: false,
            slots: ItemType::STREAMED
                .iter()
                .map(|kind| (*kind, SlotTable::with_capacity(config.capacity(*kind))))
                .collect(),
            areas: BTreeSet::new(),
            active_checkpoints: BTreeMap::new(),
            interaction: None,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn world(&self) -> i32 {
        self.world
    }

    pub fn interior(&self) -> i32 {
        self.interior
    }

    pub fn is_spectating(&self) -> bool {
        self.spectating
    }

    pub fn slots(&self, kind: ItemType) -> Option<&SlotTable> {
        self.slots.get(&kind)
    }

    /// Visible items of one type with their slots, in id order.
    pub fn visible(&self, kind: ItemType) -> impl Iterator<Item = (ItemId, NativeSlot)> + '_ {
        self.slots.get(&kind).into_iter().flat_map(SlotTable::iter)
    }

    pub fn visible_count(&self, kind: ItemType) -> usize {
        self.slots.get(&kind).map_or(0, SlotTable::len)
    }

    pub fn slot_of(&self, key: ItemKey) -> Option<NativeSlot> {
        self.slots.get(&key.kind)?.slot_of(key.id)
    }

    pub fn is_visible(&self, key: ItemKey) -> bool {
        self.slot_of(key).is_some()
    }

    /// Areas the participant is currently inside.
    pub fn areas(&self) -> &BTreeSet<ItemId> {
        &self.areas
    }

    pub fn is_in_area(&self, area: ItemId) -> bool {
        self.areas.contains(&area)
    }

    /// The checkpoint of `kind` currently shown to this participant.
    pub fn visible_checkpoint(&self, kind: ItemType) -> Option<ItemId> {
        self.visible(kind).next().map(|(id, _)| id)
    }

    pub fn active_checkpoint(&self, kind: ItemType) -> Option<ItemId> {
        self.active_checkpoints.get(&kind).copied()
    }

    pub fn checkpoint_state(&self, key: ItemKey) -> CheckpointState {
        if self.active_checkpoint(key.kind) == Some(key.id) {
            CheckpointState::Active
        } else if self.is_visible(key) {
            CheckpointState::Visible
        } else {
            CheckpointState::Invisible
        }
    }

    pub fn interaction(&self) -> Option<ObjectInteraction> {
        self.interaction
    }
}
