use glam::Vec3;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use streamer_common::{
    ConfigError, ItemId, ItemKey, ItemType, PlayerId, Pose, StreamerConfig, VehicleId,
};
use streamer_kernel::{AttachmentResolver, ItemDef, RegistryError, World, WorldEvent};

use crate::areas::{self, AreaDiff};
use crate::event::StreamEvent;
use crate::grid::{CellIndex, Footprint};
use crate::player::{InteractionKind, ObjectInteraction, PlayerState};
use crate::rank::{self, Candidate};
use crate::registry::Registry;
use crate::slots::{NativeSlot, SlotAttributes, SlotError};
use crate::stats::{StreamStats, TickTimer};

const TIMER_HISTORY: usize = 120;

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("player {0:?} is not connected")]
    UnknownPlayer(PlayerId),
    #[error("player {0:?} is outside the supported player range")]
    PlayerOutOfRange(PlayerId),
    #[error("player {0:?} is already connected")]
    AlreadyConnected(PlayerId),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Slot(#[from] SlotError),
}

/// Visible (player, item, slot) triples captured before an evaluation.
type Snapshot = Vec<(PlayerId, ItemKey, NativeSlot)>;

/// The streaming scheduler.
///
/// Owns the item registry, one cell index per item type and the state of
/// every connected participant. Each [`tick`](Self::tick) advances motions,
/// resolves attachments, re-indexes moved items and then re-evaluates every
/// participant. Registry edits made through [`edit`](Self::edit) re-evaluate
/// the affected participants immediately.
pub struct Streamer {
    config: StreamerConfig,
    world: World,
    indices: BTreeMap<ItemType, CellIndex>,
    players: BTreeMap<PlayerId, PlayerState>,
    events: Vec<StreamEvent>,
    stats: StreamStats,
    timer: TickTimer,
    ticks: u64,
    now_ms: u64,
}

impl Streamer {
    pub fn new(config: StreamerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let indices = ItemType::ALL
            .iter()
            .map(|kind| {
                (
                    *kind,
                    CellIndex::new(config.cell_size, config.max_footprint_cells as usize),
                )
            })
            .collect();
        Ok(Self {
            world: World::with_identifier_limit(config.identifier_limit),
            config,
            indices,
            players: BTreeMap::new(),
            events: Vec::new(),
            stats: StreamStats::default(),
            timer: TickTimer::new(TIMER_HISTORY),
            ticks: 0,
            now_ms: 0,
        })
    }

    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn index(&self, kind: ItemType) -> Option<&CellIndex> {
        self.indices.get(&kind)
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Host time of the latest tick.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Statistics of the latest tick.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn timer(&self) -> &TickTimer {
        &self.timer
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.get(&id)
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut PlayerState, StreamError> {
        self.players
            .get_mut(&id)
            .ok_or(StreamError::UnknownPlayer(id))
    }

    /// Take every event produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<StreamEvent> {
        std::mem::take(&mut self.events)
    }

    /// Pending events, oldest first.
    pub fn pending_events(&self) -> &[StreamEvent] {
        &self.events
    }

    // --- Registry edits ---

    /// Mutate the registry, then bring the index and every affected
    /// participant up to date.
    pub fn edit<R>(&mut self, edit: impl FnOnce(&mut Registry<'_>) -> R) -> R {
        let result = edit(&mut Registry::new(&mut self.world));
        self.refresh_after_edit();
        result
    }

    pub fn create_item(&mut self, def: ItemDef) -> Result<ItemKey, StreamError> {
        Ok(self.edit(|world| world.create(def))?)
    }

    pub fn destroy_item(&mut self, key: ItemKey) -> Result<(), StreamError> {
        self.edit(|world| world.destroy(key))?;
        Ok(())
    }

    pub fn set_item_position(&mut self, key: ItemKey, position: Vec3) -> Result<(), StreamError> {
        Ok(self.edit(|world| world.set_position(key, position))?)
    }

    // --- Participants ---

    pub fn connect(&mut self, id: PlayerId, position: Vec3) -> Result<(), StreamError> {
        if !id.is_valid() {
            return Err(StreamError::PlayerOutOfRange(id));
        }
        if self.players.contains_key(&id) {
            return Err(StreamError::AlreadyConnected(id));
        }
        self.players
            .insert(id, PlayerState::new(id, position, &self.config));
        self.world.set_player_pose(id, Pose::at(position));
        tracing::debug!(player = id.0, "player connected");
        Ok(())
    }

    /// Drop a participant. Slots are released without stream-out events;
    /// the released pairs are returned to the host.
    pub fn disconnect(&mut self, id: PlayerId) -> Result<Vec<(ItemKey, NativeSlot)>, StreamError> {
        let mut player = self
            .players
            .remove(&id)
            .ok_or(StreamError::UnknownPlayer(id))?;
        let mut released = Vec::new();
        for (kind, table) in &mut player.slots {
            released.extend(
                table
                    .clear()
                    .into_iter()
                    .map(|(item, slot)| (ItemKey::new(*kind, item), slot)),
            );
        }
        if let Some(interaction) = player.interaction.take() {
            self.conclude_interaction(interaction);
        }
        self.world.remove_player(id);
        self.events.retain(|event| event.player() != Some(id));
        self.refresh_after_edit();
        tracing::debug!(player = id.0, released = released.len(), "player disconnected");
        Ok(released)
    }

    /// Update a participant's position and facing (degrees about Z).
    pub fn move_player(&mut self, id: PlayerId, position: Vec3, facing: f32) -> Result<(), StreamError> {
        self.player_mut(id)?.position = position;
        self.world.set_player_pose(id, Pose::facing(position, facing));
        Ok(())
    }

    pub fn set_player_world(&mut self, id: PlayerId, world: i32, interior: i32) -> Result<(), StreamError> {
        let player = self.player_mut(id)?;
        player.world = world;
        player.interior = interior;
        Ok(())
    }

    pub fn set_player_spectating(&mut self, id: PlayerId, spectating: bool) -> Result<(), StreamError> {
        self.player_mut(id)?.spectating = spectating;
        Ok(())
    }

    pub fn set_vehicle_pose(&mut self, vehicle: VehicleId, pose: Pose) {
        self.world.set_vehicle_pose(vehicle, pose);
    }

    pub fn remove_vehicle(&mut self, vehicle: VehicleId) {
        self.world.remove_vehicle(vehicle);
    }

    /// Evaluate one participant now instead of waiting for the next tick.
    pub fn refresh_player(&mut self, id: PlayerId) -> Result<(), StreamError> {
        if !self.players.contains_key(&id) {
            return Err(StreamError::UnknownPlayer(id));
        }
        let mut stats = StreamStats::default();
        self.evaluate_players(&[id], &mut stats);
        self.stats.absorb(&stats);
        Ok(())
    }

    // --- Ticking ---

    /// Run one evaluation tick at host time `now_ms` and return every event
    /// produced since the previous drain.
    pub fn tick(&mut self, now_ms: u64) -> Vec<StreamEvent> {
        let _span = tracing::info_span!("streamer_tick", tick = self.ticks).entered();
        let started = Instant::now();
        self.now_ms = now_ms;

        self.world.advance_motions(now_ms);
        AttachmentResolver::resolve_all(&mut self.world);
        let (touched, _) = self.sync_index();
        let before = self.snapshot(&touched);

        let ids: Vec<PlayerId> = self.players.keys().copied().collect();
        let mut stats = StreamStats::default();
        self.evaluate_players(&ids, &mut stats);
        self.emit_updates(before);

        stats.tick_time = started.elapsed();
        self.timer.record(&stats);
        tracing::trace!(
            players = stats.players_evaluated,
            candidates = stats.candidates_considered,
            streamed_in = stats.streamed_in,
            streamed_out = stats.streamed_out,
            "tick complete"
        );
        self.stats = stats;
        self.ticks += 1;
        self.drain_events()
    }

    /// Apply registry events to the index and participant state.
    /// Returns the items that changed and the participants they affect.
    fn sync_index(&mut self) -> (BTreeSet<ItemKey>, BTreeSet<PlayerId>) {
        let mut touched = BTreeSet::new();
        let mut affected = BTreeSet::new();
        for event in self.world.drain_events() {
            match event {
                WorldEvent::Created { key }
                | WorldEvent::Relocated { key, .. }
                | WorldEvent::Updated { key }
                | WorldEvent::Attached { key, .. } => {
                    self.reindex(key);
                    touched.insert(key);
                }
                WorldEvent::Detached {
                    key,
                    position,
                    dangling,
                    ..
                } => {
                    self.reindex(key);
                    touched.insert(key);
                    if dangling {
                        self.events.push(StreamEvent::Detached { key, position });
                    }
                }
                WorldEvent::Destroyed { key, .. } => {
                    if let Some(index) = self.indices.get_mut(&key.kind) {
                        index.remove(key.id);
                    }
                    touched.remove(&key);
                    affected.extend(self.forget_item(key));
                }
                WorldEvent::MotionFinished { key } => {
                    self.events.push(StreamEvent::MotionFinished { key });
                    touched.insert(key);
                }
            }
        }
        for player in self.players.values() {
            let reaches = |key: &ItemKey| {
                player.is_visible(*key)
                    || (key.kind == ItemType::Area && player.is_in_area(key.id))
                    || self
                        .indices
                        .get(&key.kind)
                        .is_some_and(|index| index.covers(key.id, player.position.truncate()))
            };
            if touched.iter().any(reaches) {
                affected.insert(player.id);
            }
        }
        (touched, affected)
    }

    fn reindex(&mut self, key: ItemKey) {
        let Some(index) = self.indices.get_mut(&key.kind) else {
            return;
        };
        match self.world.get(key) {
            Some(item) => index.relocate(key.id, Footprint::of(item)),
            None => {
                index.remove(key.id);
            }
        }
    }

    /// Drop every participant's reference to a destroyed item.
    fn forget_item(&mut self, key: ItemKey) -> Vec<PlayerId> {
        let mut affected = Vec::new();
        for player in self.players.values_mut() {
            let mut seen = false;
            if let Some(slot) = player
                .slots
                .get_mut(&key.kind)
                .and_then(|table| table.release_item(key.id))
            {
                tracing::debug!(player = player.id.0, %key, %slot, "destroyed item streamed out");
                self.events.push(StreamEvent::StreamOut {
                    player: player.id,
                    key,
                    slot,
                    callbacks: false,
                });
                seen = true;
            }
            if key.kind == ItemType::Area {
                seen |= player.areas.remove(&key.id);
            }
            if player.active_checkpoints.get(&key.kind) == Some(&key.id) {
                player.active_checkpoints.remove(&key.kind);
            }
            if key.kind == ItemType::Object
                && player.interaction.is_some_and(|i| i.object == key.id)
            {
                player.interaction = None;
            }
            if seen {
                affected.push(player.id);
            }
        }
        affected
    }

    fn refresh_after_edit(&mut self) {
        // Attached items take their anchor's pose before anyone sees them.
        AttachmentResolver::resolve_all(&mut self.world);
        let (touched, affected) = self.sync_index();
        if affected.is_empty() {
            return;
        }
        let before = self.snapshot(&touched);
        let ids: Vec<PlayerId> = affected.into_iter().collect();
        let mut stats = StreamStats::default();
        self.evaluate_players(&ids, &mut stats);
        self.stats.absorb(&stats);
        self.emit_updates(before);
    }

    fn snapshot(&self, touched: &BTreeSet<ItemKey>) -> Snapshot {
        let mut visible = Vec::new();
        for key in touched.iter().filter(|k| k.kind.uses_slots()) {
            for player in self.players.values() {
                if let Some(slot) = player.slot_of(*key) {
                    visible.push((player.id, *key, slot));
                }
            }
        }
        visible
    }

    /// Report in-place changes for items that stayed in the same slot.
    fn emit_updates(&mut self, before: Snapshot) {
        for (player, key, slot) in before {
            let unchanged = self
                .players
                .get(&player)
                .is_some_and(|p| p.slot_of(key) == Some(slot));
            if unchanged && self.world.contains(key) {
                self.events.push(StreamEvent::Updated { player, key, slot });
            }
        }
    }

    fn evaluate_players(&mut self, ids: &[PlayerId], stats: &mut StreamStats) {
        for id in ids {
            let Some(player) = self.players.get_mut(id) else {
                continue;
            };
            evaluate_player(
                &self.world,
                &self.indices,
                &self.config,
                player,
                &mut self.events,
                stats,
            );
        }
    }

    // --- Interactions and confirmations ---

    /// Start editing or selecting an object. The object is pinned to
    /// always-visible until the interaction ends.
    pub fn begin_object_interaction(
        &mut self,
        player: PlayerId,
        object: ItemId,
        kind: InteractionKind,
    ) -> Result<(), StreamError> {
        let key = ItemKey::new(ItemType::Object, object);
        if !self.world.contains(key) {
            return Err(RegistryError::ItemNotFound(key).into());
        }
        if let Some(previous) = self.player_mut(player)?.interaction.take() {
            self.conclude_interaction(previous);
        }
        let pinned = self.world.pin_comparable(key)?;
        self.player_mut(player)?.interaction = Some(ObjectInteraction {
            object,
            kind,
            pinned,
        });
        tracing::debug!(player = player.0, %key, ?kind, "object interaction started");
        self.refresh_after_edit();
        Ok(())
    }

    /// Finish the participant's current interaction, unpinning the object.
    pub fn end_object_interaction(
        &mut self,
        player: PlayerId,
    ) -> Result<Option<ObjectInteraction>, StreamError> {
        let Some(interaction) = self.player_mut(player)?.interaction.take() else {
            return Ok(None);
        };
        self.conclude_interaction(interaction);
        self.refresh_after_edit();
        tracing::debug!(player = player.0, object = %interaction.object, "object interaction ended");
        Ok(Some(interaction))
    }

    fn conclude_interaction(&mut self, interaction: ObjectInteraction) {
        if !interaction.pinned {
            return;
        }
        let key = ItemKey::new(ItemType::Object, interaction.object);
        if let Err(err) = self.world.unpin_comparable(key) {
            tracing::debug!(%key, %err, "interaction object gone before unpin");
        }
    }

    /// The participant reports standing in its visible checkpoint of `kind`.
    /// Returns the checkpoint that became active.
    pub fn confirm_checkpoint_entered(
        &mut self,
        player: PlayerId,
        kind: ItemType,
    ) -> Result<Option<ItemId>, StreamError> {
        let state = self.player_mut(player)?;
        let visible = state.visible_checkpoint(kind);
        match visible {
            Some(id) if kind.is_checkpoint() && state.active_checkpoint(kind) != Some(id) => {
                state.active_checkpoints.insert(kind, id);
                tracing::debug!(player = player.0, %kind, %id, "checkpoint active");
                Ok(Some(id))
            }
            _ => {
                tracing::warn!(player = player.0, %kind, "ignoring checkpoint entry confirmation");
                Ok(None)
            }
        }
    }

    /// The participant reports leaving its active checkpoint of `kind`.
    /// Returns the checkpoint that stopped being active.
    pub fn confirm_checkpoint_left(
        &mut self,
        player: PlayerId,
        kind: ItemType,
    ) -> Result<Option<ItemId>, StreamError> {
        let state = self.player_mut(player)?;
        let active = state.active_checkpoint(kind);
        if active.is_some() && active == state.visible_checkpoint(kind) {
            state.active_checkpoints.remove(&kind);
            tracing::debug!(player = player.0, %kind, "checkpoint inactive");
            return Ok(active);
        }
        tracing::warn!(player = player.0, %kind, "ignoring checkpoint exit confirmation");
        Ok(None)
    }

    // --- Native slot lookups ---

    /// Map a native slot reported by the host back to a dynamic id.
    pub fn resolve_slot(&self, player: PlayerId, kind: ItemType, slot: NativeSlot) -> Option<ItemId> {
        self.players.get(&player)?.slots(kind)?.occupant(slot)
    }

    pub fn slot_attributes(
        &self,
        player: PlayerId,
        kind: ItemType,
        slot: NativeSlot,
    ) -> Option<SlotAttributes> {
        self.players.get(&player)?.slots(kind)?.attributes(slot)
    }

    pub fn is_player_in_area(&self, player: PlayerId, area: ItemId) -> bool {
        self.players
            .get(&player)
            .is_some_and(|p| p.is_in_area(area))
    }

    pub fn is_point_in_area(&self, area: ItemId, point: Vec3) -> bool {
        areas::is_point_in_area(&self.world, area, point)
    }

    pub fn areas_at_point(&self, point: Vec3) -> BTreeSet<ItemId> {
        match self.indices.get(&ItemType::Area) {
            Some(index) => areas::areas_at_point(&self.world, index, point),
            None => BTreeSet::new(),
        }
    }
}

/// Re-evaluate one participant: area containment, then every streamed type.
fn evaluate_player(
    world: &World,
    indices: &BTreeMap<ItemType, CellIndex>,
    config: &StreamerConfig,
    player: &mut PlayerState,
    events: &mut Vec<StreamEvent>,
    stats: &mut StreamStats,
) {
    stats.players_evaluated += 1;
    if let Some(index) = indices.get(&ItemType::Area) {
        let inside = areas::containing_areas(world, index, player);
        let diff = AreaDiff::between(&player.areas, &inside);
        for area in &diff.left {
            tracing::debug!(player = player.id.0, %area, "left area");
            events.push(StreamEvent::AreaLeft {
                player: player.id,
                area: *area,
            });
        }
        for area in &diff.entered {
            tracing::debug!(player = player.id.0, %area, "entered area");
            events.push(StreamEvent::AreaEntered {
                player: player.id,
                area: *area,
            });
        }
        stats.area_transitions += diff.entered.len() + diff.left.len();
        player.areas = inside;
    }
    for kind in ItemType::STREAMED {
        if let Some(index) = indices.get(&kind) {
            evaluate_type(world, index, config.capacity(kind), kind, player, events, stats);
        }
    }
}

fn evaluate_type(
    world: &World,
    index: &CellIndex,
    capacity: usize,
    kind: ItemType,
    player: &mut PlayerState,
    events: &mut Vec<StreamEvent>,
    stats: &mut StreamStats,
) {
    let Some(table) = player.slots.get(&kind) else {
        return;
    };
    let position = player.position;
    let mut candidates = Vec::new();
    for id in index.query(position.truncate(), 0.0) {
        let Some(item) = world.get(ItemKey::new(kind, id)) else {
            continue;
        };
        let filters = &item.base.filters;
        if !filters.admits_player(player.id, player.world, player.interior)
            || !filters.admits_areas(&player.areas)
        {
            continue;
        }
        let distance = item.position().distance_squared(position);
        if !item.base.comparable.admits(distance) {
            continue;
        }
        candidates.push(Candidate {
            id,
            rank: item.base.comparable.rank(distance),
            priority: item.base.priority,
            incumbent: table.slot_of(id).is_some(),
        });
    }
    stats.candidates_considered += candidates.len();

    let selected = rank::select_top(candidates, capacity.min(table.capacity()));
    let chosen: BTreeSet<ItemId> = selected.iter().map(|c| c.id).collect();
    let Some(table) = player.slots.get_mut(&kind) else {
        return;
    };

    let leaving: Vec<(ItemId, NativeSlot)> =
        table.iter().filter(|(id, _)| !chosen.contains(id)).collect();
    for (id, slot) in leaving {
        table.release(slot);
        let key = ItemKey::new(kind, id);
        tracing::debug!(player = player.id.0, %key, %slot, "stream out");
        events.push(StreamEvent::StreamOut {
            player: player.id,
            key,
            slot,
            callbacks: world.get(key).is_some_and(|i| i.base.stream_callbacks),
        });
        stats.streamed_out += 1;
    }

    for candidate in selected.iter().filter(|c| !c.incumbent) {
        let key = ItemKey::new(kind, candidate.id);
        match table.assign(candidate.id) {
            Ok(slot) => {
                let Some(item) = world.get(key) else {
                    continue;
                };
                if let Some(attributes) = table.attributes_mut(slot) {
                    attributes.shootable = item.is_shootable();
                }
                tracing::debug!(player = player.id.0, %key, %slot, "stream in");
                events.push(StreamEvent::StreamIn {
                    player: player.id,
                    key,
                    slot,
                    callbacks: item.base.stream_callbacks,
                });
                stats.streamed_in += 1;
            }
            Err(err) => {
                tracing::warn!(player = player.id.0, %key, %err, "slot assignment failed");
                stats.capacity_failures += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::CheckpointState;
    use streamer_kernel::{Anchor, Attachment, ItemKind};

    fn streamer() -> Streamer {
        Streamer::new(StreamerConfig::default()).unwrap()
    }

    fn pickup(position: Vec3) -> ItemDef {
        ItemDef::new(ItemKind::pickup(1239, 1), position).stream_distance(50.0)
    }

    fn stream_ins(events: &[StreamEvent]) -> Vec<ItemKey> {
        events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::StreamIn { key, .. } => Some(*key),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn ticks_are_sampled_with_their_participants() {
        let mut s = streamer();
        s.connect(PlayerId(0), Vec3::ZERO).unwrap();
        s.connect(PlayerId(1), Vec3::X).unwrap();
        s.tick(0);
        s.tick(50);
        assert_eq!(s.timer().count(), 2);
        assert_eq!(s.timer().latest().map(|t| t.players), Some(2));
        assert!(s.timer().per_player() <= s.timer().max());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = StreamerConfig {
            cell_size: 0.0,
            ..StreamerConfig::default()
        };
        assert!(Streamer::new(config).is_err());
    }

    #[test]
    fn connect_validates_players() {
        let mut s = streamer();
        s.connect(PlayerId(0), Vec3::ZERO).unwrap();
        assert!(matches!(
            s.connect(PlayerId(0), Vec3::ZERO),
            Err(StreamError::AlreadyConnected(_))
        ));
        assert!(matches!(
            s.connect(PlayerId(5000), Vec3::ZERO),
            Err(StreamError::PlayerOutOfRange(_))
        ));
        assert!(matches!(
            s.move_player(PlayerId(1), Vec3::ZERO, 0.0),
            Err(StreamError::UnknownPlayer(_))
        ));
    }

    #[test]
    fn tick_streams_items_in_range() {
        let mut s = streamer();
        let near = s.create_item(pickup(Vec3::new(10.0, 0.0, 0.0))).unwrap();
        let far = s.create_item(pickup(Vec3::new(500.0, 0.0, 0.0))).unwrap();
        s.connect(PlayerId(0), Vec3::ZERO).unwrap();

        let events = s.tick(0);
        assert_eq!(stream_ins(&events), vec![near]);
        let p = s.player(PlayerId(0)).unwrap();
        assert!(p.is_visible(near));
        assert!(!p.is_visible(far));
        assert_eq!(s.stats().streamed_in, 1);
    }

    #[test]
    fn creation_near_a_player_streams_in_immediately() {
        let mut s = streamer();
        s.connect(PlayerId(0), Vec3::ZERO).unwrap();
        s.tick(0);
        let key = s.create_item(pickup(Vec3::new(5.0, 0.0, 0.0))).unwrap();
        assert_eq!(stream_ins(s.pending_events()), vec![key]);
    }

    #[test]
    fn destroy_streams_out_and_refills() {
        let mut config = StreamerConfig::default();
        config.limits.set(ItemType::Pickup, 1);
        let mut s = Streamer::new(config).unwrap();
        let a = s.create_item(pickup(Vec3::new(10.0, 0.0, 0.0))).unwrap();
        let b = s.create_item(pickup(Vec3::new(20.0, 0.0, 0.0))).unwrap();
        s.connect(PlayerId(0), Vec3::ZERO).unwrap();
        s.tick(0);
        assert!(s.player(PlayerId(0)).unwrap().is_visible(a));

        s.destroy_item(a).unwrap();
        let events = s.drain_events();
        assert!(events.iter().any(
            |e| matches!(e, StreamEvent::StreamOut { key, .. } if *key == a)
        ));
        assert_eq!(stream_ins(&events), vec![b]);
    }

    #[test]
    fn moving_an_item_reports_update_in_place() {
        let mut s = streamer();
        let key = s.create_item(pickup(Vec3::new(10.0, 0.0, 0.0))).unwrap();
        s.connect(PlayerId(0), Vec3::ZERO).unwrap();
        s.tick(0);
        s.set_item_position(key, Vec3::new(12.0, 0.0, 0.0)).unwrap();
        let events = s.drain_events();
        assert_eq!(
            events,
            vec![StreamEvent::Updated {
                player: PlayerId(0),
                key,
                slot: NativeSlot(0)
            }]
        );
    }

    #[test]
    fn world_and_interior_filters() {
        let mut s = streamer();
        let key = s
            .create_item(pickup(Vec3::ZERO).worlds([3]).interiors([1]))
            .unwrap();
        s.connect(PlayerId(0), Vec3::ZERO).unwrap();
        s.tick(0);
        assert!(!s.player(PlayerId(0)).unwrap().is_visible(key));
        s.set_player_world(PlayerId(0), 3, 1).unwrap();
        s.tick(1);
        assert!(s.player(PlayerId(0)).unwrap().is_visible(key));
    }

    #[test]
    fn area_events_are_reported() {
        let mut s = streamer();
        let area = s
            .create_item(ItemDef::area(streamer_common::Shape::Sphere {
                center: Vec3::ZERO,
                radius: 5.0,
            }))
            .unwrap();
        s.connect(PlayerId(1), Vec3::new(100.0, 0.0, 0.0)).unwrap();
        assert!(s.tick(0).is_empty());

        s.move_player(PlayerId(1), Vec3::new(1.0, 0.0, 0.0), 0.0).unwrap();
        let events = s.tick(1);
        assert_eq!(
            events,
            vec![StreamEvent::AreaEntered {
                player: PlayerId(1),
                area: area.id
            }]
        );
        assert!(s.is_player_in_area(PlayerId(1), area.id));

        s.move_player(PlayerId(1), Vec3::new(100.0, 0.0, 0.0), 0.0).unwrap();
        let events = s.tick(2);
        assert!(matches!(events.as_slice(), [StreamEvent::AreaLeft { .. }]));
    }

    #[test]
    fn area_filtered_items_follow_containment() {
        let mut s = streamer();
        let area = s
            .create_item(ItemDef::area(streamer_common::Shape::Rectangle {
                min: glam::Vec2::new(-10.0, -10.0),
                max: glam::Vec2::new(10.0, 10.0),
            }))
            .unwrap();
        let label = s
            .create_item(
                ItemDef::new(ItemKind::text_label("vip", 0xFFFFFFFF), Vec3::new(20.0, 0.0, 0.0))
                    .areas([area.id]),
            )
            .unwrap();
        s.connect(PlayerId(0), Vec3::new(15.0, 0.0, 0.0)).unwrap();
        s.tick(0);
        assert!(!s.player(PlayerId(0)).unwrap().is_visible(label));
        s.move_player(PlayerId(0), Vec3::new(5.0, 0.0, 0.0), 0.0).unwrap();
        s.tick(1);
        assert!(s.player(PlayerId(0)).unwrap().is_visible(label));
    }

    #[test]
    fn interaction_pins_object_beyond_range() {
        let mut s = streamer();
        let object = s
            .create_item(
                ItemDef::new(ItemKind::object(1337, Vec3::ZERO), Vec3::new(40.0, 0.0, 0.0))
                    .stream_distance(50.0),
            )
            .unwrap();
        s.connect(PlayerId(0), Vec3::ZERO).unwrap();
        s.tick(0);
        s.begin_object_interaction(PlayerId(0), object.id, InteractionKind::Edit)
            .unwrap();
        assert!(s.world().get(object).unwrap().base.comparable.is_pinned());

        s.move_player(PlayerId(0), Vec3::new(1000.0, 0.0, 0.0), 0.0).unwrap();
        s.tick(1);
        assert!(s.player(PlayerId(0)).unwrap().is_visible(object));

        let ended = s.end_object_interaction(PlayerId(0)).unwrap();
        assert_eq!(ended.map(|i| i.object), Some(object.id));
        assert!(!s.world().get(object).unwrap().base.comparable.is_pinned());
        assert_eq!(s.end_object_interaction(PlayerId(0)).unwrap(), None);
        s.tick(2);
        assert!(!s.player(PlayerId(0)).unwrap().is_visible(object));
    }

    #[test]
    fn checkpoint_confirmations_follow_the_state_machine() {
        let mut s = streamer();
        let cp = s
            .create_item(ItemDef::new(ItemKind::checkpoint(3.0), Vec3::new(5.0, 0.0, 0.0)))
            .unwrap();
        s.connect(PlayerId(0), Vec3::ZERO).unwrap();

        // Nothing visible yet: the confirmation is inconsistent.
        assert_eq!(s.confirm_checkpoint_entered(PlayerId(0), ItemType::Checkpoint).unwrap(), None);
        s.tick(0);
        assert_eq!(
            s.confirm_checkpoint_entered(PlayerId(0), ItemType::Checkpoint).unwrap(),
            Some(cp.id)
        );
        // Already active.
        assert_eq!(s.confirm_checkpoint_entered(PlayerId(0), ItemType::Checkpoint).unwrap(), None);
        assert_eq!(
            s.confirm_checkpoint_left(PlayerId(0), ItemType::Checkpoint).unwrap(),
            Some(cp.id)
        );
        assert_eq!(s.confirm_checkpoint_left(PlayerId(0), ItemType::Checkpoint).unwrap(), None);
    }

    #[test]
    fn switching_visible_checkpoint_keeps_the_active_one() {
        let mut s = streamer();
        let p = PlayerId(0);
        let a = s
            .create_item(
                ItemDef::new(ItemKind::checkpoint(3.0), Vec3::new(5.0, 0.0, 0.0)).stream_distance(50.0),
            )
            .unwrap();
        let b = s
            .create_item(
                ItemDef::new(ItemKind::checkpoint(3.0), Vec3::new(300.0, 0.0, 0.0))
                    .stream_distance(50.0),
            )
            .unwrap();
        s.connect(p, Vec3::ZERO).unwrap();
        s.tick(0);
        assert_eq!(s.confirm_checkpoint_entered(p, ItemType::Checkpoint).unwrap(), Some(a.id));

        s.move_player(p, Vec3::new(300.0, 0.0, 0.0), 0.0).unwrap();
        s.tick(50);
        let state = s.player(p).unwrap();
        assert_eq!(state.visible_checkpoint(ItemType::Checkpoint), Some(b.id));
        assert_eq!(state.checkpoint_state(a), CheckpointState::Active);
        assert_eq!(state.checkpoint_state(b), CheckpointState::Visible);

        // The exit report belongs to a checkpoint no longer shown.
        assert_eq!(s.confirm_checkpoint_left(p, ItemType::Checkpoint).unwrap(), None);
        assert_eq!(
            s.player(p).unwrap().active_checkpoint(ItemType::Checkpoint),
            Some(a.id)
        );
        assert_eq!(s.confirm_checkpoint_entered(p, ItemType::Checkpoint).unwrap(), Some(b.id));
        let state = s.player(p).unwrap();
        assert_eq!(state.checkpoint_state(a), CheckpointState::Invisible);
        assert_eq!(state.checkpoint_state(b), CheckpointState::Active);
        assert_eq!(s.confirm_checkpoint_left(p, ItemType::Checkpoint).unwrap(), Some(b.id));
    }

    #[test]
    fn destroying_the_active_checkpoint_clears_it() {
        let mut s = streamer();
        let cp = s
            .create_item(ItemDef::new(ItemKind::checkpoint(3.0), Vec3::ZERO))
            .unwrap();
        s.connect(PlayerId(0), Vec3::ZERO).unwrap();
        s.tick(0);
        s.confirm_checkpoint_entered(PlayerId(0), ItemType::Checkpoint).unwrap();
        s.destroy_item(cp).unwrap();
        assert_eq!(s.player(PlayerId(0)).unwrap().active_checkpoint(ItemType::Checkpoint), None);
    }

    #[test]
    fn resolve_slot_and_shootable_attribute() {
        let mut s = streamer();
        let object = s
            .create_item(ItemDef::new(ItemKind::object(1, Vec3::ZERO), Vec3::ZERO))
            .unwrap();
        s.connect(PlayerId(0), Vec3::ZERO).unwrap();
        s.tick(0);
        let slot = s.player(PlayerId(0)).unwrap().slot_of(object).unwrap();
        assert_eq!(s.resolve_slot(PlayerId(0), ItemType::Object, slot), Some(object.id));
        assert_eq!(
            s.slot_attributes(PlayerId(0), ItemType::Object, slot),
            Some(SlotAttributes { shootable: true })
        );
        assert_eq!(s.resolve_slot(PlayerId(0), ItemType::Object, NativeSlot(99)), None);
    }

    #[test]
    fn dangling_attachment_is_reported() {
        let mut s = streamer();
        s.set_vehicle_pose(VehicleId(8), Pose::at(Vec3::new(10.0, 0.0, 0.0)));
        let obj = s
            .create_item(ItemDef::new(ItemKind::object(1, Vec3::ZERO), Vec3::ZERO))
            .unwrap();
        s.edit(|w| w.attach(obj, Attachment::new(Anchor::Vehicle(VehicleId(8)), Vec3::Z)))
            .unwrap();
        s.tick(0);
        assert_eq!(s.world().get(obj).unwrap().position(), Vec3::new(10.0, 0.0, 1.0));

        s.remove_vehicle(VehicleId(8));
        let events = s.tick(1);
        assert!(events.iter().any(|e| matches!(
            e,
            StreamEvent::Detached { key, position } if *key == obj && *position == Vec3::ZERO
        )));
    }

    #[test]
    fn motion_finishes_and_is_reported() {
        let mut s = streamer();
        let obj = s
            .create_item(ItemDef::new(ItemKind::object(1, Vec3::ZERO), Vec3::ZERO))
            .unwrap();
        s.edit(|w| w.start_motion(obj, Vec3::new(10.0, 0.0, 0.0), 10.0, None, 0))
            .unwrap();
        s.tick(500);
        assert!((s.world().get(obj).unwrap().position().x - 5.0).abs() < 1e-3);
        let events = s.tick(1000);
        assert!(events.contains(&StreamEvent::MotionFinished { key: obj }));
    }
}
