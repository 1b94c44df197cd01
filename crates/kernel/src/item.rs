//! Item definitions and their streaming attributes.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use streamer_common::{ItemId, ItemKey, ItemType, PlayerId, PlayerMask, ScriptId, Shape, VehicleId};

use crate::shared::SharedHandle;

/// Comparable distance of an item that is visible regardless of range.
pub const STATIC_DISTANCE: f32 = -1.0;
/// Comparable distances below this value mark an item as static.
pub const STATIC_DISTANCE_CUTOFF: f32 = 0.0;

/// Squared visibility radius used for ranking, with an optional pin to
/// [`STATIC_DISTANCE`].
///
/// While pinned, `original` holds the unpinned value so it can be restored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparableDistance {
    current: f32,
    original: Option<f32>,
}

impl ComparableDistance {
    /// Negative stream distances make the item permanently static.
    pub fn from_stream_distance(distance: f32) -> Self {
        let current = if distance < STATIC_DISTANCE_CUTOFF {
            STATIC_DISTANCE
        } else {
            distance * distance
        };
        Self {
            current,
            original: None,
        }
    }

    pub fn value(&self) -> f32 {
        self.current
    }

    pub fn is_static(&self) -> bool {
        self.current < STATIC_DISTANCE_CUTOFF
    }

    pub fn is_pinned(&self) -> bool {
        self.original.is_some()
    }

    /// Pin to the static sentinel. No-op for items that are already static.
    pub fn pin(&mut self) -> bool {
        if self.original.is_some() || self.current <= STATIC_DISTANCE_CUTOFF {
            return false;
        }
        self.original = Some(self.current);
        self.current = STATIC_DISTANCE;
        true
    }

    /// Restore the value saved by [`pin`](Self::pin).
    pub fn unpin(&mut self) -> bool {
        match self.original {
            Some(original)
                if self.current < STATIC_DISTANCE_CUTOFF && original > STATIC_DISTANCE_CUTOFF =>
            {
                self.current = original;
                self.original = None;
                true
            }
            _ => false,
        }
    }

    /// Change the underlying radius. While pinned only the saved value changes.
    pub fn set_stream_distance(&mut self, distance: f32) {
        let fresh = Self::from_stream_distance(distance);
        if self.original.is_some() && !fresh.is_static() && fresh.current > STATIC_DISTANCE_CUTOFF {
            self.original = Some(fresh.current);
        } else {
            *self = fresh;
        }
    }

    /// Whether an item at `distance_squared` from the viewer is within range.
    pub fn admits(&self, distance_squared: f32) -> bool {
        self.is_static() || distance_squared <= self.current
    }

    /// Ranking key for an item at `distance_squared`.
    pub fn rank(&self, distance_squared: f32) -> f32 {
        if self.is_static() {
            STATIC_DISTANCE
        } else {
            distance_squared
        }
    }
}

/// Visibility filters independent of distance. Empty sets do not restrict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub worlds: BTreeSet<i32>,
    pub interiors: BTreeSet<i32>,
    pub areas: BTreeSet<ItemId>,
    pub players: PlayerMask,
    /// Admit only while the player is outside every listed area.
    pub inverse_area_checking: bool,
}

impl Filters {
    pub fn admits_player(&self, player: PlayerId, world: i32, interior: i32) -> bool {
        self.players.contains(player)
            && (self.worlds.is_empty() || self.worlds.contains(&world))
            && (self.interiors.is_empty() || self.interiors.contains(&interior))
    }

    /// Area filter given the set of areas the player is currently inside.
    pub fn admits_areas(&self, inside: &BTreeSet<ItemId>) -> bool {
        if self.areas.is_empty() {
            return true;
        }
        let any = self.areas.iter().any(|a| inside.contains(a));
        any != self.inverse_area_checking
    }
}

/// What an attached item follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Object(ItemId),
    Player(PlayerId),
    Vehicle(VehicleId),
}

/// Attachment record, owned by exactly one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub anchor: Anchor,
    pub offset: Vec3,
    /// Local rotation relative to the anchor (objects only).
    pub rotation: Vec3,
    pub sync_rotation: bool,
    /// Static position restored when the attachment is torn down.
    pub rest_position: Vec3,
}

impl Attachment {
    pub fn new(anchor: Anchor, offset: Vec3) -> Self {
        Self {
            anchor,
            offset,
            rotation: Vec3::ZERO,
            sync_rotation: false,
            rest_position: Vec3::ZERO,
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3, sync_rotation: bool) -> Self {
        self.rotation = rotation;
        self.sync_rotation = sync_rotation;
        self
    }
}

/// Attributes common to every item type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemBase {
    pub script: ScriptId,
    pub position: Vec3,
    pub stream_distance: f32,
    pub comparable: ComparableDistance,
    pub priority: i32,
    /// Report stream-in/out transitions of this item to scripts.
    pub stream_callbacks: bool,
    pub filters: Filters,
    pub extras: Vec<i32>,
    pub extra_extras: BTreeMap<i32, Vec<i32>>,
}

impl ItemBase {
    pub fn new(position: Vec3, stream_distance: f32) -> Self {
        Self {
            script: ScriptId::default(),
            position,
            stream_distance,
            comparable: ComparableDistance::from_stream_distance(stream_distance),
            priority: 0,
            stream_callbacks: false,
            filters: Filters::default(),
            extras: Vec::new(),
            extra_extras: BTreeMap::new(),
        }
    }
}

/// Texture replacement on one material index of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureMaterial {
    pub model: i32,
    pub txd: String,
    pub texture: String,
    pub color: u32,
}

/// Text rendered onto one material index of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMaterial {
    pub text: String,
    pub material_size: i32,
    pub font_face: String,
    pub font_size: i32,
    pub bold: bool,
    pub font_color: u32,
    pub back_color: u32,
    pub alignment: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialOverride {
    Texture(SharedHandle),
    Text(SharedHandle),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub library: String,
    pub name: String,
    pub delta: f32,
    pub looped: bool,
    pub lock_x: bool,
    pub lock_y: bool,
    pub freeze: bool,
    pub time: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectData {
    pub model: i32,
    pub rotation: Vec3,
    pub draw_distance: f32,
    pub no_camera_collision: bool,
    pub shootable: bool,
    pub attach: Option<Attachment>,
    pub materials: BTreeMap<u8, MaterialOverride>,
    pub motion: Option<SharedHandle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupData {
    pub model: i32,
    pub pickup_type: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointData {
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceCheckpointData {
    pub checkpoint_type: i32,
    pub next: Vec3,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapIconData {
    pub icon: i32,
    pub color: u32,
    pub style: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLabelData {
    pub text: String,
    pub color: u32,
    pub draw_distance: f32,
    pub test_los: bool,
    pub attach: Option<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaData {
    /// Shape as defined (or last placed) by the script.
    pub shape: Shape,
    /// Shape used for containment; differs from `shape` while attached.
    pub effective: Shape,
    pub spectate_mode: bool,
    pub attach: Option<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorData {
    pub model: i32,
    pub rotation: f32,
    pub health: f32,
    pub invulnerable: bool,
    pub animation: Option<SharedHandle>,
}

/// Type-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Object(ObjectData),
    Pickup(PickupData),
    Checkpoint(CheckpointData),
    RaceCheckpoint(RaceCheckpointData),
    MapIcon(MapIconData),
    TextLabel(TextLabelData),
    Area(AreaData),
    Actor(ActorData),
}

impl ItemKind {
    pub fn object(model: i32, rotation: Vec3) -> Self {
        ItemKind::Object(ObjectData {
            model,
            rotation,
            draw_distance: 0.0,
            no_camera_collision: false,
            shootable: true,
            attach: None,
            materials: BTreeMap::new(),
            motion: None,
        })
    }

    pub fn pickup(model: i32, pickup_type: i32) -> Self {
        ItemKind::Pickup(PickupData { model, pickup_type })
    }

    pub fn checkpoint(size: f32) -> Self {
        ItemKind::Checkpoint(CheckpointData { size })
    }

    pub fn race_checkpoint(checkpoint_type: i32, next: Vec3, size: f32) -> Self {
        ItemKind::RaceCheckpoint(RaceCheckpointData {
            checkpoint_type,
            next,
            size,
        })
    }

    pub fn map_icon(icon: i32, color: u32, style: i32) -> Self {
        ItemKind::MapIcon(MapIconData { icon, color, style })
    }

    pub fn text_label(text: impl Into<String>, color: u32) -> Self {
        ItemKind::TextLabel(TextLabelData {
            text: text.into(),
            color,
            draw_distance: 0.0,
            test_los: false,
            attach: None,
        })
    }

    pub fn area(shape: Shape) -> Self {
        ItemKind::Area(AreaData {
            effective: shape.clone(),
            shape,
            spectate_mode: true,
            attach: None,
        })
    }

    pub fn actor(model: i32, rotation: f32) -> Self {
        ItemKind::Actor(ActorData {
            model,
            rotation,
            health: 100.0,
            invulnerable: true,
            animation: None,
        })
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            ItemKind::Object(_) => ItemType::Object,
            ItemKind::Pickup(_) => ItemType::Pickup,
            ItemKind::Checkpoint(_) => ItemType::Checkpoint,
            ItemKind::RaceCheckpoint(_) => ItemType::RaceCheckpoint,
            ItemKind::MapIcon(_) => ItemType::MapIcon,
            ItemKind::TextLabel(_) => ItemType::TextLabel,
            ItemKind::Area(_) => ItemType::Area,
            ItemKind::Actor(_) => ItemType::Actor,
        }
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        match self {
            ItemKind::Object(o) => o.attach.as_ref(),
            ItemKind::TextLabel(t) => t.attach.as_ref(),
            ItemKind::Area(a) => a.attach.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn attachment_slot(&mut self) -> Option<&mut Option<Attachment>> {
        match self {
            ItemKind::Object(o) => Some(&mut o.attach),
            ItemKind::TextLabel(t) => Some(&mut t.attach),
            ItemKind::Area(a) => Some(&mut a.attach),
            _ => None,
        }
    }

    /// Whether items of this kind may follow `anchor`.
    pub fn accepts_anchor(&self, anchor: &Anchor) -> bool {
        match self {
            ItemKind::Object(_) | ItemKind::Area(_) => true,
            ItemKind::TextLabel(_) => !matches!(anchor, Anchor::Object(_)),
            _ => false,
        }
    }

    /// Shared sub-records this payload holds references to.
    pub(crate) fn has_shared_records(&self) -> bool {
        match self {
            ItemKind::Object(o) => !o.materials.is_empty() || o.motion.is_some(),
            ItemKind::Actor(a) => a.animation.is_some(),
            _ => false,
        }
    }
}

/// Definition passed to [`World::create`](crate::World::create).
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDef {
    pub base: ItemBase,
    pub kind: ItemKind,
}

impl ItemDef {
    /// Definition at `position` with the type's default stream distance.
    /// Areas take their position from the shape.
    pub fn new(kind: ItemKind, position: Vec3) -> Self {
        let position = match &kind {
            ItemKind::Area(area) => area.shape.reference_point(),
            _ => position,
        };
        let distance = kind.item_type().default_stream_distance();
        Self {
            base: ItemBase::new(position, distance),
            kind,
        }
    }

    pub fn area(shape: Shape) -> Self {
        Self::new(ItemKind::area(shape), Vec3::ZERO)
    }

    pub fn stream_distance(mut self, distance: f32) -> Self {
        self.base.stream_distance = distance;
        self.base.comparable = ComparableDistance::from_stream_distance(distance);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.base.priority = priority;
        self
    }

    pub fn script(mut self, script: ScriptId) -> Self {
        self.base.script = script;
        self
    }

    pub fn worlds(mut self, worlds: impl IntoIterator<Item = i32>) -> Self {
        self.base.filters.worlds = worlds.into_iter().collect();
        self
    }

    pub fn interiors(mut self, interiors: impl IntoIterator<Item = i32>) -> Self {
        self.base.filters.interiors = interiors.into_iter().collect();
        self
    }

    pub fn areas(mut self, areas: impl IntoIterator<Item = ItemId>) -> Self {
        self.base.filters.areas = areas.into_iter().collect();
        self
    }

    pub fn players(mut self, players: PlayerMask) -> Self {
        self.base.filters.players = players;
        self
    }

    pub fn inverse_area_checking(mut self, inverse: bool) -> Self {
        self.base.filters.inverse_area_checking = inverse;
        self
    }

    pub fn stream_callbacks(mut self, enabled: bool) -> Self {
        self.base.stream_callbacks = enabled;
        self
    }

    pub fn extras(mut self, extras: Vec<i32>) -> Self {
        self.base.extras = extras;
        self
    }
}

/// A live item in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    /// Attachments naming this item as their anchor.
    pub(crate) references: u32,
    pub base: ItemBase,
    pub kind: ItemKind,
}

impl Item {
    pub(crate) fn new(id: ItemId, def: ItemDef) -> Self {
        Self {
            id,
            references: 0,
            base: def.base,
            kind: def.kind,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.item_type(), self.id)
    }

    pub fn references(&self) -> u32 {
        self.references
    }

    pub fn position(&self) -> Vec3 {
        self.base.position
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.kind.attachment()
    }

    /// Containment shape, for areas.
    pub fn shape(&self) -> Option<&Shape> {
        match &self.kind {
            ItemKind::Area(area) => Some(&area.effective),
            _ => None,
        }
    }

    /// Euler rotation in degrees, for types that carry one.
    pub fn rotation(&self) -> Vec3 {
        match &self.kind {
            ItemKind::Object(o) => o.rotation,
            ItemKind::Actor(a) => Vec3::new(0.0, 0.0, a.rotation),
            _ => Vec3::ZERO,
        }
    }

    pub fn is_shootable(&self) -> bool {
        matches!(&self.kind, ItemKind::Object(o) if o.shootable)
    }
}
