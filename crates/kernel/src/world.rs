use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use streamer_common::{
    ItemId, ItemKey, ItemType, PlayerId, Pose, ScriptId, ShapeError, VehicleId, euler_to_quat,
};

use crate::identifier::{Identifier, IdentifierError};
use crate::item::{
    Anchor, Animation, Attachment, Filters, Item, ItemDef, ItemKind, MaterialOverride,
    ObjectData, TextMaterial, TextureMaterial,
};
use crate::motion::Motion;
use crate::shared::{SharedHandle, SharedPool};

/// Positions closer than this are treated as unchanged.
const MOVE_EPSILON: f32 = 1.0e-6;

/// Errors from registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("{0} not found")]
    ItemNotFound(ItemKey),
    #[error("{key} is not a {expected}")]
    WrongType { key: ItemKey, expected: ItemType },
    #[error("invalid item definition: {0}")]
    InvalidDefinition(&'static str),
    #[error("invalid area shape: {0}")]
    Shape(#[from] ShapeError),
    #[error("area filter of area {0} forms a containment cycle")]
    AreaCycle(ItemId),
    #[error("{kind} items cannot attach to {anchor:?}")]
    InvalidAnchor { kind: ItemType, anchor: Anchor },
    #[error("attaching {0} would form an attachment cycle")]
    AttachmentCycle(ItemKey),
    #[error("anchor {0:?} does not exist")]
    MissingAnchor(Anchor),
    #[error("{0} is attached and cannot move on its own")]
    Attached(ItemKey),
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
}

/// An event record produced by every registry mutation.
///
/// The streaming layer drains these to keep its spatial index and per-player
/// state in step with the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    Created {
        key: ItemKey,
    },
    Destroyed {
        key: ItemKey,
        script: ScriptId,
    },
    Relocated {
        key: ItemKey,
        from: Vec3,
        to: Vec3,
    },
    /// Streaming attributes or payload changed in place.
    Updated {
        key: ItemKey,
    },
    Attached {
        key: ItemKey,
        anchor: Anchor,
    },
    /// Attachment removed. `dangling` marks a teardown caused by a vanished anchor.
    Detached {
        key: ItemKey,
        anchor: Anchor,
        position: Vec3,
        dangling: bool,
    },
    MotionFinished {
        key: ItemKey,
    },
}

/// Borrowed view of one material override.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialView<'a> {
    Texture(&'a TextureMaterial),
    Text(&'a TextMaterial),
}

/// Live record counts of every shared pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SharedCounts {
    pub textures: usize,
    pub texts: usize,
    pub animations: usize,
    pub motions: usize,
}

/// The authoritative item registry.
///
/// Items are stored per type in id-keyed arenas; every cross-reference
/// (anchors, area filters) is an id resolved through this registry. Uses
/// BTreeMap throughout for deterministic iteration order.
#[derive(Debug, Clone)]
pub struct World {
    identifier_limit: u32,
    identifiers: BTreeMap<ItemType, Identifier>,
    items: BTreeMap<ItemType, BTreeMap<ItemId, Item>>,
    /// Destroyed items whose ids wait on outstanding references.
    retired: BTreeMap<ItemKey, u32>,
    textures: SharedPool<TextureMaterial>,
    texts: SharedPool<TextMaterial>,
    animations: SharedPool<Animation>,
    motions: SharedPool<Motion>,
    /// Items that currently have an attachment.
    attached: BTreeSet<ItemKey>,
    /// Objects with a motion in progress.
    moving: BTreeSet<ItemKey>,
    players: BTreeMap<PlayerId, Pose>,
    vehicles: BTreeMap<VehicleId, Pose>,
    event_log: Vec<WorldEvent>,
}

impl Default for World {
    fn default() -> Self {
        Self::with_identifier_limit(i32::MAX as u32)
    }
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose per-type identifier space ends at `limit`.
    pub fn with_identifier_limit(limit: u32) -> Self {
        Self {
            identifier_limit: limit,
            identifiers: ItemType::ALL
                .iter()
                .map(|kind| (*kind, Identifier::new(limit)))
                .collect(),
            items: ItemType::ALL
                .iter()
                .map(|kind| (*kind, BTreeMap::new()))
                .collect(),
            retired: BTreeMap::new(),
            textures: SharedPool::new(),
            texts: SharedPool::new(),
            animations: SharedPool::new(),
            motions: SharedPool::new(),
            attached: BTreeSet::new(),
            moving: BTreeSet::new(),
            players: BTreeMap::new(),
            vehicles: BTreeMap::new(),
            event_log: Vec::new(),
        }
    }

    /// Total number of live items across all types.
    pub fn len(&self) -> usize {
        self.items.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn item_count(&self, kind: ItemType) -> usize {
        self.items.get(&kind).map_or(0, BTreeMap::len)
    }

    /// Highest live dynamic id of a type.
    pub fn highest_id(&self, kind: ItemType) -> Option<ItemId> {
        self.identifiers.get(&kind).and_then(Identifier::highest_live)
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    pub fn get(&self, key: ItemKey) -> Option<&Item> {
        self.items.get(&key.kind).and_then(|m| m.get(&key.id))
    }

    pub fn contains(&self, key: ItemKey) -> bool {
        self.get(key).is_some()
    }

    /// Items of one type in id order.
    pub fn items(&self, kind: ItemType) -> impl Iterator<Item = &Item> {
        self.items.get(&kind).into_iter().flat_map(BTreeMap::values)
    }

    /// Keys of every item that currently has an attachment.
    pub fn attached_items(&self) -> Vec<ItemKey> {
        self.attached.iter().copied().collect()
    }

    /// Keys of every object currently in motion.
    pub fn moving_items(&self) -> Vec<ItemKey> {
        self.moving.iter().copied().collect()
    }

    fn item_mut(&mut self, key: ItemKey) -> Result<&mut Item, RegistryError> {
        self.items
            .get_mut(&key.kind)
            .and_then(|m| m.get_mut(&key.id))
            .ok_or(RegistryError::ItemNotFound(key))
    }

    fn object_mut(&mut self, key: ItemKey) -> Result<&mut ObjectData, RegistryError> {
        match &mut self.item_mut(key)?.kind {
            ItemKind::Object(o) => Ok(o),
            _ => Err(RegistryError::WrongType {
                key,
                expected: ItemType::Object,
            }),
        }
    }

    fn expect_type(&self, key: ItemKey, expected: ItemType) -> Result<&Item, RegistryError> {
        let item = self.get(key).ok_or(RegistryError::ItemNotFound(key))?;
        if item.item_type() != expected {
            return Err(RegistryError::WrongType { key, expected });
        }
        Ok(item)
    }

    // --- Lifecycle ---

    /// Admit a new item. Shape, area filter and attachment are validated
    /// before the item becomes visible to anything else.
    pub fn create(&mut self, mut def: ItemDef) -> Result<ItemKey, RegistryError> {
        let kind = def.kind.item_type();
        if def.kind.has_shared_records() {
            return Err(RegistryError::InvalidDefinition(
                "shared records are assigned after creation",
            ));
        }
        if !def.base.position.is_finite() {
            return Err(RegistryError::InvalidDefinition("position must be finite"));
        }
        if def.base.stream_distance.is_nan() {
            return Err(RegistryError::InvalidDefinition(
                "stream distance must be a number",
            ));
        }
        if let ItemKind::Area(area) = &mut def.kind {
            area.shape.validate()?;
            area.effective = area.shape.clone();
        }
        let attachment = def.kind.attachment_slot().and_then(Option::take);
        if let Some(attachment) = &attachment {
            self.validate_attachment(None, &def.kind, &attachment.anchor)?;
        }

        let limit = self.identifier_limit;
        let id = self
            .identifiers
            .entry(kind)
            .or_insert_with(|| Identifier::new(limit))
            .acquire()?;
        let key = ItemKey::new(kind, id);
        if kind == ItemType::Area {
            if let Err(err) = self.check_area_filter(id, &def.base.filters.areas) {
                self.release_id(key);
                return Err(err);
            }
        }

        self.items
            .entry(kind)
            .or_default()
            .insert(id, Item::new(id, def));
        self.event_log.push(WorldEvent::Created { key });
        tracing::debug!(%key, "item created");

        if let Some(attachment) = attachment {
            self.attach(key, attachment)?;
        }
        Ok(key)
    }

    /// Remove an item, release its shared records and, once nothing refers
    /// to it, its id.
    pub fn destroy(&mut self, key: ItemKey) -> Result<Item, RegistryError> {
        let item = self
            .items
            .get_mut(&key.kind)
            .and_then(|m| m.remove(&key.id))
            .ok_or(RegistryError::ItemNotFound(key))?;

        match &item.kind {
            ItemKind::Object(o) => {
                for material in o.materials.values() {
                    self.release_material(*material);
                }
                if let Some(handle) = o.motion {
                    self.motions.release(handle);
                }
            }
            ItemKind::Actor(a) => {
                if let Some(handle) = a.animation {
                    self.animations.release(handle);
                }
            }
            _ => {}
        }
        if let Some(Anchor::Object(anchor)) = item.attachment().map(|a| a.anchor) {
            self.drop_reference(ItemKey::new(ItemType::Object, anchor));
        }
        self.attached.remove(&key);
        self.moving.remove(&key);

        if item.references == 0 {
            self.release_id(key);
        } else {
            tracing::debug!(%key, references = item.references, "id release deferred");
            self.retired.insert(key, item.references);
        }
        self.event_log.push(WorldEvent::Destroyed {
            key,
            script: item.base.script,
        });
        tracing::debug!(%key, "item destroyed");
        Ok(item)
    }

    /// Destroy every item created by `script`. Returns the destroyed keys.
    pub fn destroy_script_items(&mut self, script: ScriptId) -> Vec<ItemKey> {
        let keys: Vec<ItemKey> = self
            .items
            .values()
            .flat_map(BTreeMap::values)
            .filter(|item| item.base.script == script)
            .map(Item::key)
            .collect();
        keys.into_iter()
            .filter(|key| self.destroy(*key).is_ok())
            .collect()
    }

    /// Record an outside reference to an item, delaying reuse of its id.
    pub fn add_reference(&mut self, key: ItemKey) -> Result<(), RegistryError> {
        self.item_mut(key)?.references += 1;
        Ok(())
    }

    /// Drop a reference taken with [`add_reference`](Self::add_reference).
    /// Releases the id of a destroyed item once its last reference is gone.
    pub fn drop_reference(&mut self, key: ItemKey) -> bool {
        if let Ok(item) = self.item_mut(key) {
            item.references = item.references.saturating_sub(1);
            return true;
        }
        let Some(references) = self.retired.get_mut(&key) else {
            return false;
        };
        *references -= 1;
        if *references == 0 {
            self.retired.remove(&key);
            self.release_id(key);
        }
        true
    }

    /// Whether `key` was destroyed but its id is still held by references.
    pub fn is_retired(&self, key: ItemKey) -> bool {
        self.retired.contains_key(&key)
    }

    fn release_id(&mut self, key: ItemKey) {
        if let Some(ids) = self.identifiers.get_mut(&key.kind) {
            if let Err(err) = ids.release(key.id) {
                tracing::warn!(%key, %err, "identifier release failed");
            }
        }
    }

    // --- Streaming attributes ---

    pub fn set_position(&mut self, key: ItemKey, position: Vec3) -> Result<(), RegistryError> {
        if !position.is_finite() {
            return Err(RegistryError::InvalidDefinition("position must be finite"));
        }
        let item = self.item_mut(key)?;
        let from = item.base.position;
        item.base.position = position;
        if let ItemKind::Area(area) = &mut item.kind {
            area.shape = area.shape.placed_at(position);
            if area.attach.is_none() {
                area.effective = area.shape.clone();
            }
        }
        if let Some(Some(attachment)) = item.kind.attachment_slot() {
            attachment.rest_position = position;
        }
        self.event_log.push(WorldEvent::Relocated {
            key,
            from,
            to: position,
        });
        Ok(())
    }

    /// Set the Euler rotation (degrees) of an object, or the facing of an actor.
    pub fn set_rotation(&mut self, key: ItemKey, rotation: Vec3) -> Result<(), RegistryError> {
        let item = self.item_mut(key)?;
        match &mut item.kind {
            ItemKind::Object(o) => o.rotation = rotation,
            ItemKind::Actor(a) => a.rotation = rotation.z,
            _ => {
                return Err(RegistryError::WrongType {
                    key,
                    expected: ItemType::Object,
                });
            }
        }
        self.event_log.push(WorldEvent::Updated { key });
        Ok(())
    }

    pub fn set_stream_distance(&mut self, key: ItemKey, distance: f32) -> Result<(), RegistryError> {
        if distance.is_nan() {
            return Err(RegistryError::InvalidDefinition(
                "stream distance must be a number",
            ));
        }
        let item = self.item_mut(key)?;
        item.base.stream_distance = distance;
        item.base.comparable.set_stream_distance(distance);
        self.event_log.push(WorldEvent::Updated { key });
        Ok(())
    }

    pub fn set_priority(&mut self, key: ItemKey, priority: i32) -> Result<(), RegistryError> {
        self.item_mut(key)?.base.priority = priority;
        self.event_log.push(WorldEvent::Updated { key });
        Ok(())
    }

    /// Replace an item's filters. For areas the area filter must stay acyclic.
    pub fn set_filters(&mut self, key: ItemKey, filters: Filters) -> Result<(), RegistryError> {
        if !self.contains(key) {
            return Err(RegistryError::ItemNotFound(key));
        }
        if key.kind == ItemType::Area {
            self.check_area_filter(key.id, &filters.areas)?;
        }
        self.item_mut(key)?.base.filters = filters;
        self.event_log.push(WorldEvent::Updated { key });
        Ok(())
    }

    pub fn set_stream_callbacks(&mut self, key: ItemKey, enabled: bool) -> Result<(), RegistryError> {
        self.item_mut(key)?.base.stream_callbacks = enabled;
        Ok(())
    }

    pub fn set_extras(&mut self, key: ItemKey, extras: Vec<i32>) -> Result<(), RegistryError> {
        self.item_mut(key)?.base.extras = extras;
        Ok(())
    }

    pub fn set_extra_extras(
        &mut self,
        key: ItemKey,
        index: i32,
        values: Vec<i32>,
    ) -> Result<(), RegistryError> {
        let extra = &mut self.item_mut(key)?.base.extra_extras;
        if values.is_empty() {
            extra.remove(&index);
        } else {
            extra.insert(index, values);
        }
        Ok(())
    }

    /// Edit type-specific payload fields such as model, text or colour.
    /// The edit may not change the item type, its attachment or its shared records.
    pub fn update_payload(
        &mut self,
        key: ItemKey,
        edit: impl FnOnce(&mut ItemKind),
    ) -> Result<(), RegistryError> {
        let item = self.item_mut(key)?;
        let saved = item.kind.clone();
        edit(&mut item.kind);
        let kept = item.kind.item_type() == saved.item_type()
            && item.kind.attachment() == saved.attachment()
            && shared_handles(&item.kind) == shared_handles(&saved)
            && area_shape(&item.kind) == area_shape(&saved);
        if !kept {
            item.kind = saved;
            return Err(RegistryError::InvalidDefinition(
                "payload edits cannot change type, attachment, shape or shared records",
            ));
        }
        self.event_log.push(WorldEvent::Updated { key });
        Ok(())
    }

    /// Pin the comparable distance to "always visible". Returns false when
    /// the item was already static.
    pub fn pin_comparable(&mut self, key: ItemKey) -> Result<bool, RegistryError> {
        let pinned = self.item_mut(key)?.base.comparable.pin();
        if pinned {
            tracing::debug!(%key, "comparable distance pinned");
            self.event_log.push(WorldEvent::Updated { key });
        }
        Ok(pinned)
    }

    /// Undo [`pin_comparable`](Self::pin_comparable).
    pub fn unpin_comparable(&mut self, key: ItemKey) -> Result<bool, RegistryError> {
        let restored = self.item_mut(key)?.base.comparable.unpin();
        if restored {
            tracing::debug!(%key, "comparable distance restored");
            self.event_log.push(WorldEvent::Updated { key });
        }
        Ok(restored)
    }

    fn check_area_filter(&self, area: ItemId, areas: &BTreeSet<ItemId>) -> Result<(), RegistryError> {
        let mut stack: Vec<ItemId> = areas.iter().copied().collect();
        let mut seen = BTreeSet::new();
        while let Some(next) = stack.pop() {
            if next == area {
                return Err(RegistryError::AreaCycle(area));
            }
            if !seen.insert(next) {
                continue;
            }
            if let Some(item) = self.get(ItemKey::new(ItemType::Area, next)) {
                stack.extend(item.base.filters.areas.iter().copied());
            }
        }
        Ok(())
    }

    // --- Attachments ---

    /// Attach an item to an anchor, replacing any previous attachment.
    pub fn attach(&mut self, key: ItemKey, mut attachment: Attachment) -> Result<(), RegistryError> {
        let item = self.get(key).ok_or(RegistryError::ItemNotFound(key))?;
        self.validate_attachment(Some(key), &item.kind, &attachment.anchor)?;
        self.detach_inner(key, false)?;

        let released_motion = {
            let item = self.item_mut(key)?;
            attachment.rest_position = item.base.position;
            let motion = match &mut item.kind {
                ItemKind::Object(o) => o.motion.take(),
                _ => None,
            };
            if let Some(slot) = item.kind.attachment_slot() {
                *slot = Some(attachment.clone());
            }
            motion
        };
        if let Some(handle) = released_motion {
            self.motions.release(handle);
            self.moving.remove(&key);
        }
        self.attached.insert(key);
        if let Anchor::Object(anchor) = attachment.anchor {
            self.add_reference(ItemKey::new(ItemType::Object, anchor))?;
        }
        self.event_log.push(WorldEvent::Attached {
            key,
            anchor: attachment.anchor,
        });
        tracing::debug!(%key, anchor = ?attachment.anchor, "item attached");
        Ok(())
    }

    /// Remove an item's attachment and restore its static position.
    pub fn detach(&mut self, key: ItemKey) -> Result<bool, RegistryError> {
        Ok(self.detach_inner(key, false)?.is_some())
    }

    pub(crate) fn detach_dangling(&mut self, key: ItemKey) -> Result<Option<Attachment>, RegistryError> {
        self.detach_inner(key, true)
    }

    fn detach_inner(&mut self, key: ItemKey, dangling: bool) -> Result<Option<Attachment>, RegistryError> {
        let attachment = {
            let item = self.item_mut(key)?;
            let Some(attachment) = item.kind.attachment_slot().and_then(Option::take) else {
                return Ok(None);
            };
            item.base.position = attachment.rest_position;
            if let ItemKind::Area(area) = &mut item.kind {
                area.effective = area.shape.clone();
            }
            attachment
        };
        self.attached.remove(&key);
        if let Anchor::Object(anchor) = attachment.anchor {
            self.drop_reference(ItemKey::new(ItemType::Object, anchor));
        }
        self.event_log.push(WorldEvent::Detached {
            key,
            anchor: attachment.anchor,
            position: attachment.rest_position,
            dangling,
        });
        Ok(Some(attachment))
    }

    fn validate_attachment(
        &self,
        key: Option<ItemKey>,
        kind: &ItemKind,
        anchor: &Anchor,
    ) -> Result<(), RegistryError> {
        if !kind.accepts_anchor(anchor) {
            return Err(RegistryError::InvalidAnchor {
                kind: kind.item_type(),
                anchor: *anchor,
            });
        }
        match anchor {
            Anchor::Object(id) => {
                let anchor_key = ItemKey::new(ItemType::Object, *id);
                if !self.contains(anchor_key) {
                    return Err(RegistryError::MissingAnchor(*anchor));
                }
                let Some(key) = key.filter(|k| k.kind == ItemType::Object) else {
                    return Ok(());
                };
                // Follow the anchor chain; reaching `key` would close a loop.
                let mut cursor = Some(*id);
                let mut steps = 0;
                while let Some(current) = cursor {
                    if current == key.id {
                        return Err(RegistryError::AttachmentCycle(key));
                    }
                    steps += 1;
                    if steps > self.item_count(ItemType::Object) {
                        return Err(RegistryError::AttachmentCycle(key));
                    }
                    cursor = match self
                        .get(ItemKey::new(ItemType::Object, current))
                        .and_then(Item::attachment)
                    {
                        Some(Attachment {
                            anchor: Anchor::Object(next),
                            ..
                        }) => Some(*next),
                        _ => None,
                    };
                }
                Ok(())
            }
            Anchor::Player(player) if !self.players.contains_key(player) => {
                Err(RegistryError::MissingAnchor(*anchor))
            }
            Anchor::Vehicle(vehicle) if !self.vehicles.contains_key(vehicle) => {
                Err(RegistryError::MissingAnchor(*anchor))
            }
            _ => Ok(()),
        }
    }

    /// Move an attached item to its resolved pose. Returns whether anything changed.
    pub(crate) fn place_attached(&mut self, key: ItemKey, position: Vec3, rotation: Vec3) -> bool {
        let Ok(item) = self.item_mut(key) else {
            return false;
        };
        let from = item.base.position;
        let moved = from.distance_squared(position) > MOVE_EPSILON;
        let mut rotated = false;
        if moved {
            item.base.position = position;
        }
        match &mut item.kind {
            ItemKind::Object(o) if o.rotation.distance_squared(rotation) > MOVE_EPSILON => {
                o.rotation = rotation;
                rotated = true;
            }
            ItemKind::Area(area) if moved => {
                area.effective = area.shape.placed_at(position);
            }
            _ => {}
        }
        if moved {
            self.event_log.push(WorldEvent::Relocated {
                key,
                from,
                to: position,
            });
        } else if rotated {
            self.event_log.push(WorldEvent::Updated { key });
        }
        moved || rotated
    }

    // --- Anchors owned by the host ---

    pub fn set_player_pose(&mut self, player: PlayerId, pose: Pose) {
        self.players.insert(player, pose);
    }

    pub fn remove_player(&mut self, player: PlayerId) -> Option<Pose> {
        self.players.remove(&player)
    }

    pub fn player_pose(&self, player: PlayerId) -> Option<Pose> {
        self.players.get(&player).copied()
    }

    pub fn set_vehicle_pose(&mut self, vehicle: VehicleId, pose: Pose) {
        self.vehicles.insert(vehicle, pose);
    }

    pub fn remove_vehicle(&mut self, vehicle: VehicleId) -> Option<Pose> {
        self.vehicles.remove(&vehicle)
    }

    pub fn vehicle_pose(&self, vehicle: VehicleId) -> Option<Pose> {
        self.vehicles.get(&vehicle).copied()
    }

    /// Current world pose of an anchor, if it still exists.
    pub fn anchor_pose(&self, anchor: &Anchor) -> Option<Pose> {
        match anchor {
            Anchor::Object(id) => self
                .get(ItemKey::new(ItemType::Object, *id))
                .map(|item| Pose {
                    position: item.position(),
                    rotation: euler_to_quat(item.rotation()),
                }),
            Anchor::Player(player) => self.player_pose(*player),
            Anchor::Vehicle(vehicle) => self.vehicle_pose(*vehicle),
        }
    }

    // --- Shared sub-records ---

    pub fn shared_counts(&self) -> SharedCounts {
        SharedCounts {
            textures: self.textures.len(),
            texts: self.texts.len(),
            animations: self.animations.len(),
            motions: self.motions.len(),
        }
    }

    pub fn set_material_texture(
        &mut self,
        key: ItemKey,
        index: u8,
        material: TextureMaterial,
    ) -> Result<SharedHandle, RegistryError> {
        self.expect_type(key, ItemType::Object)?;
        let handle = self.textures.insert(material);
        self.put_material(key, index, MaterialOverride::Texture(handle))?;
        Ok(handle)
    }

    pub fn set_material_text(
        &mut self,
        key: ItemKey,
        index: u8,
        material: TextMaterial,
    ) -> Result<SharedHandle, RegistryError> {
        self.expect_type(key, ItemType::Object)?;
        let handle = self.texts.insert(material);
        self.put_material(key, index, MaterialOverride::Text(handle))?;
        Ok(handle)
    }

    fn put_material(
        &mut self,
        key: ItemKey,
        index: u8,
        material: MaterialOverride,
    ) -> Result<(), RegistryError> {
        let old = self.object_mut(key)?.materials.insert(index, material);
        if let Some(old) = old {
            self.release_material(old);
        }
        self.event_log.push(WorldEvent::Updated { key });
        Ok(())
    }

    pub fn remove_material(&mut self, key: ItemKey, index: u8) -> Result<bool, RegistryError> {
        let old = self.object_mut(key)?.materials.remove(&index);
        let Some(old) = old else {
            return Ok(false);
        };
        self.release_material(old);
        self.event_log.push(WorldEvent::Updated { key });
        Ok(true)
    }

    /// Share every material override of `from` with `to`, replacing `to`'s own.
    pub fn copy_materials(&mut self, from: ItemKey, to: ItemKey) -> Result<usize, RegistryError> {
        let source = match &self.expect_type(from, ItemType::Object)?.kind {
            ItemKind::Object(o) => o.materials.clone(),
            _ => BTreeMap::new(),
        };
        self.expect_type(to, ItemType::Object)?;
        for material in source.values() {
            match material {
                MaterialOverride::Texture(h) => self.textures.retain(*h),
                MaterialOverride::Text(h) => self.texts.retain(*h),
            };
        }
        let count = source.len();
        let old = std::mem::replace(&mut self.object_mut(to)?.materials, source);
        for material in old.into_values() {
            self.release_material(material);
        }
        self.event_log.push(WorldEvent::Updated { key: to });
        Ok(count)
    }

    pub fn material(&self, key: ItemKey, index: u8) -> Option<MaterialView<'_>> {
        let ItemKind::Object(o) = &self.get(key)?.kind else {
            return None;
        };
        match o.materials.get(&index)? {
            MaterialOverride::Texture(h) => self.textures.get(*h).map(MaterialView::Texture),
            MaterialOverride::Text(h) => self.texts.get(*h).map(MaterialView::Text),
        }
    }

    fn release_material(&mut self, material: MaterialOverride) {
        match material {
            MaterialOverride::Texture(h) => {
                self.textures.release(h);
            }
            MaterialOverride::Text(h) => {
                self.texts.release(h);
            }
        }
    }

    pub fn apply_animation(
        &mut self,
        key: ItemKey,
        animation: Animation,
    ) -> Result<SharedHandle, RegistryError> {
        self.expect_type(key, ItemType::Actor)?;
        let handle = self.animations.insert(animation);
        self.set_animation_handle(key, Some(handle))?;
        Ok(handle)
    }

    pub fn clear_animation(&mut self, key: ItemKey) -> Result<bool, RegistryError> {
        self.expect_type(key, ItemType::Actor)?;
        self.set_animation_handle(key, None)
    }

    /// Share `from`'s animation with `to`. Returns false if `from` has none.
    pub fn copy_animation(&mut self, from: ItemKey, to: ItemKey) -> Result<bool, RegistryError> {
        let handle = match &self.expect_type(from, ItemType::Actor)?.kind {
            ItemKind::Actor(a) => a.animation,
            _ => None,
        };
        self.expect_type(to, ItemType::Actor)?;
        let Some(handle) = handle else {
            return Ok(false);
        };
        self.animations.retain(handle);
        self.set_animation_handle(to, Some(handle))?;
        Ok(true)
    }

    pub fn animation(&self, key: ItemKey) -> Option<&Animation> {
        match &self.get(key)?.kind {
            ItemKind::Actor(a) => a.animation.and_then(|h| self.animations.get(h)),
            _ => None,
        }
    }

    fn set_animation_handle(
        &mut self,
        key: ItemKey,
        handle: Option<SharedHandle>,
    ) -> Result<bool, RegistryError> {
        let old = match &mut self.item_mut(key)?.kind {
            ItemKind::Actor(a) => std::mem::replace(&mut a.animation, handle),
            _ => None,
        };
        let had = old.is_some();
        if let Some(old) = old {
            self.animations.release(old);
        }
        self.event_log.push(WorldEvent::Updated { key });
        Ok(had)
    }

    // --- Motion ---

    /// Start moving an object towards `target` at `speed` units per second.
    /// Returns the travel time in milliseconds.
    pub fn start_motion(
        &mut self,
        key: ItemKey,
        target: Vec3,
        speed: f32,
        target_rotation: Option<Vec3>,
        now_ms: u64,
    ) -> Result<u64, RegistryError> {
        let item = self.expect_type(key, ItemType::Object)?;
        if item.attachment().is_some() {
            return Err(RegistryError::Attached(key));
        }
        if !target.is_finite() {
            return Err(RegistryError::InvalidDefinition("motion target must be finite"));
        }
        let rotation = target_rotation.map(|r| (item.rotation(), r));
        let motion = Motion::new(item.position(), target, speed, rotation, now_ms).ok_or(
            RegistryError::InvalidDefinition("motion speed must be positive"),
        )?;
        let duration = motion.duration_ms;
        let handle = self.motions.insert(motion);
        let old = self.object_mut(key)?.motion.replace(handle);
        if let Some(old) = old {
            self.motions.release(old);
        }
        self.moving.insert(key);
        self.event_log.push(WorldEvent::Updated { key });
        Ok(duration)
    }

    /// Freeze a moving object where it currently is.
    pub fn stop_motion(&mut self, key: ItemKey, now_ms: u64) -> Result<bool, RegistryError> {
        let Some(handle) = self.object_mut(key)?.motion.take() else {
            return Ok(false);
        };
        self.moving.remove(&key);
        if let Some(sample) = self.motions.get(handle).map(|m| m.sample(now_ms)) {
            self.apply_motion_sample(key, sample.position, sample.rotation);
        }
        self.motions.release(handle);
        Ok(true)
    }

    pub fn motion(&self, key: ItemKey) -> Option<&Motion> {
        match &self.get(key)?.kind {
            ItemKind::Object(o) => o.motion.and_then(|h| self.motions.get(h)),
            _ => None,
        }
    }

    /// Advance every moving object to `now_ms`. Returns the objects that moved.
    pub fn advance_motions(&mut self, now_ms: u64) -> Vec<ItemKey> {
        let moving: Vec<(ItemKey, SharedHandle)> = self
            .moving
            .iter()
            .filter_map(|key| match &self.get(*key)?.kind {
                ItemKind::Object(o) => o.motion.map(|h| (*key, h)),
                _ => None,
            })
            .collect();
        let mut moved = Vec::with_capacity(moving.len());
        for (key, handle) in moving {
            let Some(sample) = self.motions.get(handle).map(|m| m.sample(now_ms)) else {
                continue;
            };
            self.apply_motion_sample(key, sample.position, sample.rotation);
            moved.push(key);
            if sample.finished {
                if let Ok(o) = self.object_mut(key) {
                    o.motion = None;
                }
                self.moving.remove(&key);
                self.motions.release(handle);
                self.event_log.push(WorldEvent::MotionFinished { key });
                tracing::debug!(%key, "motion finished");
            }
        }
        moved
    }

    fn apply_motion_sample(&mut self, key: ItemKey, position: Vec3, rotation: Option<Vec3>) {
        let Ok(item) = self.item_mut(key) else {
            return;
        };
        let from = item.base.position;
        item.base.position = position;
        if let (ItemKind::Object(o), Some(rotation)) = (&mut item.kind, rotation) {
            o.rotation = rotation;
        }
        self.event_log.push(WorldEvent::Relocated {
            key,
            from,
            to: position,
        });
    }
}

fn shared_handles(kind: &ItemKind) -> (Vec<MaterialOverride>, Option<SharedHandle>) {
    match kind {
        ItemKind::Object(o) => (o.materials.values().copied().collect(), o.motion),
        ItemKind::Actor(a) => (Vec::new(), a.animation),
        _ => (Vec::new(), None),
    }
}

fn area_shape(kind: &ItemKind) -> Option<(&streamer_common::Shape, &streamer_common::Shape)> {
    match kind {
        ItemKind::Area(area) => Some((&area.shape, &area.effective)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemDef;
    use glam::Vec2;
    use streamer_common::Shape;

    fn object_at(world: &mut World, position: Vec3) -> ItemKey {
        world
            .create(ItemDef::new(ItemKind::object(1337, Vec3::ZERO), position))
            .unwrap()
    }

    fn circle_area(world: &mut World, areas: &[ItemId]) -> ItemKey {
        world
            .create(
                ItemDef::area(Shape::Circle {
                    center: Vec2::ZERO,
                    radius: 10.0,
                })
                .areas(areas.iter().copied()),
            )
            .unwrap()
    }

    #[test]
    fn world_starts_empty() {
        let w = World::new();
        assert!(w.is_empty());
        assert_eq!(w.highest_id(ItemType::Object), None);
    }

    #[test]
    fn create_and_destroy() {
        let mut w = World::new();
        let key = object_at(&mut w, Vec3::ZERO);
        assert_eq!(key.id, ItemId(1));
        assert_eq!(w.len(), 1);
        assert!(w.contains(key));

        let item = w.destroy(key).unwrap();
        assert_eq!(item.key(), key);
        assert!(w.is_empty());
        assert!(matches!(
            w.destroy(key),
            Err(RegistryError::ItemNotFound(_))
        ));
    }

    #[test]
    fn ids_are_per_type_and_reused() {
        let mut w = World::new();
        let a = object_at(&mut w, Vec3::ZERO);
        let b = object_at(&mut w, Vec3::ZERO);
        let p = w
            .create(ItemDef::new(ItemKind::pickup(1, 1), Vec3::ZERO))
            .unwrap();
        assert_eq!(p.id, ItemId(1));
        w.destroy(a).unwrap();
        let c = object_at(&mut w, Vec3::ZERO);
        assert_eq!(c.id, a.id);
        assert_eq!(w.highest_id(ItemType::Object), Some(b.id));
    }

    #[test]
    fn identifier_exhaustion_is_reported() {
        let mut w = World::with_identifier_limit(1);
        object_at(&mut w, Vec3::ZERO);
        let err = w
            .create(ItemDef::new(ItemKind::object(1, Vec3::ZERO), Vec3::ZERO))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Identifier(IdentifierError::Exhausted { limit: 1 })
        ));
    }

    #[test]
    fn events_are_recorded() {
        let mut w = World::new();
        let key = object_at(&mut w, Vec3::ZERO);
        w.set_position(key, Vec3::ONE).unwrap();
        w.set_priority(key, 4).unwrap();
        w.destroy(key).unwrap();
        let events = w.drain_events();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[1], WorldEvent::Relocated { to, .. } if to == Vec3::ONE));
        assert!(w.events().is_empty());
    }

    #[test]
    fn invalid_shape_is_not_admitted() {
        let mut w = World::new();
        let err = w
            .create(ItemDef::area(Shape::Circle {
                center: Vec2::ZERO,
                radius: -1.0,
            }))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Shape(_)));
        assert!(w.is_empty());
        assert!(w.events().is_empty());
    }

    #[test]
    fn area_cycles_are_rejected() {
        let mut w = World::new();
        let a = circle_area(&mut w, &[]);
        let b = circle_area(&mut w, &[a.id]);

        let mut filters = w.get(a).unwrap().base.filters.clone();
        filters.areas.insert(b.id);
        assert!(matches!(
            w.set_filters(a, filters),
            Err(RegistryError::AreaCycle(_))
        ));

        let mut own = Filters::default();
        own.areas.insert(b.id);
        assert!(matches!(
            w.set_filters(b, own),
            Err(RegistryError::AreaCycle(_))
        ));
    }

    #[test]
    fn area_listing_a_future_self_is_rejected() {
        let mut w = World::new();
        // Area 1 lists area 2 before it exists; area 2 listing area 1 closes the loop.
        circle_area(&mut w, &[ItemId(2)]);
        let err = w
            .create(
                ItemDef::area(Shape::Circle {
                    center: Vec2::ZERO,
                    radius: 1.0,
                })
                .areas([ItemId(1)]),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::AreaCycle(ItemId(2))));
        // The rejected id is free again.
        assert_eq!(circle_area(&mut w, &[]).id, ItemId(2));
    }

    #[test]
    fn attach_requires_existing_anchor_and_valid_kind() {
        let mut w = World::new();
        let obj = object_at(&mut w, Vec3::ZERO);
        let missing = Attachment::new(Anchor::Object(ItemId(99)), Vec3::ZERO);
        assert!(matches!(
            w.attach(obj, missing),
            Err(RegistryError::MissingAnchor(_))
        ));

        let pickup = w
            .create(ItemDef::new(ItemKind::pickup(1, 1), Vec3::ZERO))
            .unwrap();
        w.set_player_pose(PlayerId(0), Pose::default());
        assert!(matches!(
            w.attach(pickup, Attachment::new(Anchor::Player(PlayerId(0)), Vec3::ZERO)),
            Err(RegistryError::InvalidAnchor { .. })
        ));
    }

    #[test]
    fn attachment_cycles_are_rejected() {
        let mut w = World::new();
        let a = object_at(&mut w, Vec3::ZERO);
        let b = object_at(&mut w, Vec3::ZERO);
        w.attach(b, Attachment::new(Anchor::Object(a.id), Vec3::X))
            .unwrap();
        assert!(matches!(
            w.attach(a, Attachment::new(Anchor::Object(b.id), Vec3::X)),
            Err(RegistryError::AttachmentCycle(_))
        ));
        assert!(matches!(
            w.attach(a, Attachment::new(Anchor::Object(a.id), Vec3::X)),
            Err(RegistryError::AttachmentCycle(_))
        ));
    }

    #[test]
    fn anchor_reference_defers_id_release() {
        let mut w = World::new();
        let anchor = object_at(&mut w, Vec3::ZERO);
        let child = object_at(&mut w, Vec3::new(5.0, 0.0, 0.0));
        w.attach(child, Attachment::new(Anchor::Object(anchor.id), Vec3::Z))
            .unwrap();
        assert_eq!(w.get(anchor).unwrap().references(), 1);

        w.destroy(anchor).unwrap();
        assert!(w.is_retired(anchor));
        // The anchor's id is still held, so a new object gets a fresh one.
        let fresh = object_at(&mut w, Vec3::ZERO);
        assert_ne!(fresh.id, anchor.id);

        w.detach(child).unwrap();
        assert!(!w.is_retired(anchor));
        assert_eq!(object_at(&mut w, Vec3::ZERO).id, anchor.id);
    }

    #[test]
    fn detach_restores_rest_position() {
        let mut w = World::new();
        w.set_vehicle_pose(VehicleId(3), Pose::at(Vec3::new(100.0, 0.0, 0.0)));
        let label = w
            .create(ItemDef::new(ItemKind::text_label("hi", 0xFFFFFFFF), Vec3::ONE))
            .unwrap();
        w.attach(label, Attachment::new(Anchor::Vehicle(VehicleId(3)), Vec3::Z))
            .unwrap();
        assert!(w.place_attached(label, Vec3::new(100.0, 0.0, 1.0), Vec3::ZERO));
        assert_eq!(w.get(label).unwrap().position(), Vec3::new(100.0, 0.0, 1.0));
        assert!(w.detach(label).unwrap());
        assert_eq!(w.get(label).unwrap().position(), Vec3::ONE);
        assert!(!w.detach(label).unwrap());
    }

    #[test]
    fn create_with_attachment_validates_anchor() {
        let mut w = World::new();
        let mut def = ItemDef::new(ItemKind::object(1, Vec3::ZERO), Vec3::ZERO);
        if let ItemKind::Object(o) = &mut def.kind {
            o.attach = Some(Attachment::new(Anchor::Vehicle(VehicleId(1)), Vec3::ZERO));
        }
        assert!(matches!(
            w.create(def.clone()),
            Err(RegistryError::MissingAnchor(_))
        ));
        w.set_vehicle_pose(VehicleId(1), Pose::default());
        let key = w.create(def).unwrap();
        assert!(w.get(key).unwrap().attachment().is_some());
    }

    #[test]
    fn materials_are_shared_and_released_at_zero() {
        let mut w = World::new();
        let a = object_at(&mut w, Vec3::ZERO);
        let b = object_at(&mut w, Vec3::ZERO);
        w.set_material_texture(
            a,
            0,
            TextureMaterial {
                model: 1,
                txd: "txd".into(),
                texture: "brick".into(),
                color: 0,
            },
        )
        .unwrap();
        assert_eq!(w.copy_materials(a, b).unwrap(), 1);
        assert_eq!(w.shared_counts().textures, 1);

        w.destroy(a).unwrap();
        assert_eq!(w.shared_counts().textures, 1);
        assert!(matches!(w.material(b, 0), Some(MaterialView::Texture(t)) if t.texture == "brick"));

        assert!(w.remove_material(b, 0).unwrap());
        assert_eq!(w.shared_counts().textures, 0);
    }

    #[test]
    fn replacing_a_material_releases_the_old_one() {
        let mut w = World::new();
        let a = object_at(&mut w, Vec3::ZERO);
        let text = TextMaterial {
            text: "Hello".into(),
            material_size: 90,
            font_face: "Arial".into(),
            font_size: 24,
            bold: true,
            font_color: 0xFFFFFFFF,
            back_color: 0,
            alignment: 0,
        };
        w.set_material_text(a, 1, text.clone()).unwrap();
        w.set_material_text(a, 1, text).unwrap();
        assert_eq!(w.shared_counts().texts, 1);
    }

    #[test]
    fn animations_are_shared_between_actors() {
        let mut w = World::new();
        let a = w
            .create(ItemDef::new(ItemKind::actor(1, 0.0), Vec3::ZERO))
            .unwrap();
        let b = w
            .create(ItemDef::new(ItemKind::actor(2, 0.0), Vec3::ZERO))
            .unwrap();
        let anim = Animation {
            library: "PED".into(),
            name: "IDLE".into(),
            delta: 4.1,
            looped: true,
            lock_x: false,
            lock_y: false,
            freeze: false,
            time: 0,
        };
        w.apply_animation(a, anim).unwrap();
        assert!(w.copy_animation(a, b).unwrap());
        assert!(w.clear_animation(a).unwrap());
        assert_eq!(w.shared_counts().animations, 1);
        assert_eq!(w.animation(b).unwrap().name, "IDLE");
        w.destroy(b).unwrap();
        assert_eq!(w.shared_counts().animations, 0);
    }

    #[test]
    fn shared_records_in_definitions_are_rejected() {
        let mut w = World::new();
        let mut def = ItemDef::new(ItemKind::actor(1, 0.0), Vec3::ZERO);
        if let ItemKind::Actor(a) = &mut def.kind {
            a.animation = Some(SharedHandle(1));
        }
        assert!(matches!(
            w.create(def),
            Err(RegistryError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn motion_advances_and_finishes() {
        let mut w = World::new();
        let key = object_at(&mut w, Vec3::ZERO);
        let duration = w
            .start_motion(key, Vec3::new(10.0, 0.0, 0.0), 10.0, None, 0)
            .unwrap();
        assert_eq!(duration, 1000);
        w.drain_events();

        assert_eq!(w.advance_motions(500), vec![key]);
        assert!((w.get(key).unwrap().position().x - 5.0).abs() < 1e-4);

        w.advance_motions(1500);
        assert_eq!(w.get(key).unwrap().position(), Vec3::new(10.0, 0.0, 0.0));
        assert!(w.motion(key).is_none());
        assert_eq!(w.shared_counts().motions, 0);
        assert!(w
            .events()
            .iter()
            .any(|e| matches!(e, WorldEvent::MotionFinished { key: k } if *k == key)));
        assert!(w.advance_motions(2000).is_empty());
    }

    #[test]
    fn stop_motion_freezes_in_place() {
        let mut w = World::new();
        let key = object_at(&mut w, Vec3::ZERO);
        w.start_motion(key, Vec3::new(0.0, 20.0, 0.0), 10.0, None, 0)
            .unwrap();
        assert!(w.stop_motion(key, 1000).unwrap());
        assert!((w.get(key).unwrap().position().y - 10.0).abs() < 1e-4);
        assert!(!w.stop_motion(key, 1000).unwrap());
    }

    #[test]
    fn attached_objects_cannot_move() {
        let mut w = World::new();
        let a = object_at(&mut w, Vec3::ZERO);
        let b = object_at(&mut w, Vec3::ZERO);
        w.attach(b, Attachment::new(Anchor::Object(a.id), Vec3::ZERO))
            .unwrap();
        assert!(matches!(
            w.start_motion(b, Vec3::ONE, 1.0, None, 0),
            Err(RegistryError::Attached(_))
        ));
    }

    #[test]
    fn attached_and_moving_sets_follow_every_transition() {
        let mut w = World::new();
        let anchor = object_at(&mut w, Vec3::ZERO);
        let rider = object_at(&mut w, Vec3::ZERO);
        let walker = object_at(&mut w, Vec3::ZERO);
        for _ in 0..50 {
            w.create(ItemDef::new(ItemKind::pickup(1, 1), Vec3::ZERO))
                .unwrap();
        }
        assert!(w.attached_items().is_empty());
        assert!(w.moving_items().is_empty());

        w.start_motion(rider, Vec3::X, 1.0, None, 0).unwrap();
        w.start_motion(walker, Vec3::new(2.0, 0.0, 0.0), 1.0, None, 0)
            .unwrap();
        assert_eq!(w.moving_items(), vec![rider, walker]);

        // Attaching releases the motion.
        w.attach(rider, Attachment::new(Anchor::Object(anchor.id), Vec3::ZERO))
            .unwrap();
        assert_eq!(w.attached_items(), vec![rider]);
        assert_eq!(w.moving_items(), vec![walker]);

        assert!(w.detach(rider).unwrap());
        assert!(w.attached_items().is_empty());

        w.attach(rider, Attachment::new(Anchor::Object(anchor.id), Vec3::ZERO))
            .unwrap();
        w.destroy(rider).unwrap();
        assert!(w.attached_items().is_empty());

        w.advance_motions(5000);
        assert!(w.moving_items().is_empty());

        w.start_motion(walker, Vec3::ZERO, 1.0, None, 5000).unwrap();
        assert!(w.stop_motion(walker, 5500).unwrap());
        assert!(w.moving_items().is_empty());
        w.start_motion(walker, Vec3::Y, 1.0, None, 6000).unwrap();
        w.destroy(walker).unwrap();
        assert!(w.moving_items().is_empty());
        assert!(w.advance_motions(7000).is_empty());
    }

    #[test]
    fn destroy_script_items_only_touches_that_script() {
        let mut w = World::new();
        for script in [1, 2, 1] {
            w.create(
                ItemDef::new(ItemKind::pickup(1, 1), Vec3::ZERO).script(ScriptId(script)),
            )
            .unwrap();
        }
        let destroyed = w.destroy_script_items(ScriptId(1));
        assert_eq!(destroyed.len(), 2);
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn payload_edits_cannot_swap_type() {
        let mut w = World::new();
        let key = w
            .create(ItemDef::new(ItemKind::text_label("a", 0), Vec3::ZERO))
            .unwrap();
        w.update_payload(key, |kind| {
            if let ItemKind::TextLabel(t) = kind {
                t.text = "b".into();
            }
        })
        .unwrap();
        assert!(matches!(&w.get(key).unwrap().kind, ItemKind::TextLabel(t) if t.text == "b"));

        let err = w
            .update_payload(key, |kind| *kind = ItemKind::pickup(1, 1))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDefinition(_)));
        assert_eq!(w.get(key).unwrap().item_type(), ItemType::TextLabel);
    }

    #[test]
    fn pin_and_unpin_log_updates() {
        let mut w = World::new();
        let key = object_at(&mut w, Vec3::ZERO);
        w.drain_events();
        assert!(w.pin_comparable(key).unwrap());
        assert!(!w.pin_comparable(key).unwrap());
        assert!(w.unpin_comparable(key).unwrap());
        assert_eq!(w.events().len(), 2);
    }

    #[test]
    fn moving_an_area_moves_its_shape() {
        let mut w = World::new();
        let area = circle_area(&mut w, &[]);
        w.set_position(area, Vec3::new(50.0, 50.0, 0.0)).unwrap();
        let shape = w.get(area).unwrap().shape().unwrap();
        assert!(shape.contains(Vec3::new(55.0, 50.0, 0.0)));
        assert!(!shape.contains(Vec3::ZERO));
    }
}
