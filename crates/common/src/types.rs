use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest number of simultaneously connected players the host supports.
pub const MAX_PLAYERS: usize = 1000;

const MASK_WORDS: usize = MAX_PLAYERS.div_ceil(64);

/// Dynamic identifier of an item, unique within its [`ItemType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection slot of a player, `0..MAX_PLAYERS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u16);

impl PlayerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_valid(self) -> bool {
        self.index() < MAX_PLAYERS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub u32);

/// Opaque tag of the script module that created an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScriptId(pub u32);

/// The kinds of item the streamer manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Object,
    Pickup,
    Checkpoint,
    RaceCheckpoint,
    MapIcon,
    TextLabel,
    Area,
    Actor,
}

impl ItemType {
    pub const ALL: [ItemType; 8] = [
        ItemType::Object,
        ItemType::Pickup,
        ItemType::Checkpoint,
        ItemType::RaceCheckpoint,
        ItemType::MapIcon,
        ItemType::TextLabel,
        ItemType::Area,
        ItemType::Actor,
    ];

    /// Item types that occupy native slots on the client. Areas are evaluated
    /// server-side only.
    pub const STREAMED: [ItemType; 7] = [
        ItemType::Object,
        ItemType::Pickup,
        ItemType::Checkpoint,
        ItemType::RaceCheckpoint,
        ItemType::MapIcon,
        ItemType::TextLabel,
        ItemType::Actor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Object => "object",
            ItemType::Pickup => "pickup",
            ItemType::Checkpoint => "checkpoint",
            ItemType::RaceCheckpoint => "race_checkpoint",
            ItemType::MapIcon => "map_icon",
            ItemType::TextLabel => "text_label",
            ItemType::Area => "area",
            ItemType::Actor => "actor",
        }
    }

    pub fn uses_slots(self) -> bool {
        self != ItemType::Area
    }

    pub fn is_checkpoint(self) -> bool {
        matches!(self, ItemType::Checkpoint | ItemType::RaceCheckpoint)
    }

    /// Stream distance applied when a definition does not set one.
    pub fn default_stream_distance(self) -> f32 {
        match self {
            ItemType::Object => 300.0,
            ItemType::Area => 0.0,
            _ => 200.0,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully qualified item reference: type plus dynamic id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub kind: ItemType,
    pub id: ItemId,
}

impl ItemKey {
    pub fn new(kind: ItemType, id: ItemId) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// Fixed-size membership set with one bit per possible player.
///
/// Defaults to every player set; clearing a bit hides the item from that
/// player regardless of distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMask {
    words: [u64; MASK_WORDS],
}

impl PlayerMask {
    pub fn all() -> Self {
        let mut mask = Self::none();
        for i in 0..MAX_PLAYERS {
            mask.words[i / 64] |= 1 << (i % 64);
        }
        mask
    }

    pub fn none() -> Self {
        Self {
            words: [0; MASK_WORDS],
        }
    }

    pub fn only(players: impl IntoIterator<Item = PlayerId>) -> Self {
        let mut mask = Self::none();
        for p in players {
            mask.insert(p);
        }
        mask
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        player.is_valid() && self.words[player.index() / 64] & (1 << (player.index() % 64)) != 0
    }

    pub fn insert(&mut self, player: PlayerId) {
        if player.is_valid() {
            self.words[player.index() / 64] |= 1 << (player.index() % 64);
        }
    }

    pub fn remove(&mut self, player: PlayerId) {
        if player.is_valid() {
            self.words[player.index() / 64] &= !(1 << (player.index() % 64));
        }
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

impl Default for PlayerMask {
    fn default() -> Self {
        Self::all()
    }
}

/// World-space position and orientation of an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Pose of a player standing at `position` facing `facing` degrees about Z.
    pub fn facing(position: Vec3, facing: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_z(facing.to_radians()),
        }
    }

    /// Map a local offset into world space, honouring this pose's orientation.
    pub fn transform_point(&self, offset: Vec3) -> Vec3 {
        self.position + self.rotation * offset
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// Convert an (x, y, z) Euler rotation in degrees to a quaternion.
pub fn euler_to_quat(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::ZXY,
        degrees.z.to_radians(),
        degrees.x.to_radians(),
        degrees.y.to_radians(),
    )
}

/// Inverse of [`euler_to_quat`].
pub fn quat_to_euler(rotation: Quat) -> Vec3 {
    let (z, x, y) = rotation.to_euler(EulerRot::ZXY);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}
