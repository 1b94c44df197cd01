//! Streamer kernel: the authoritative item registry.
//!
//! Owns every streamable item, the per-type identifier spaces, the
//! reference-counted records items share, and the attachment resolver that
//! keeps attached items glued to their anchors.
//!
//! # Invariants
//! - Every live item has exactly one id, unique within its type.
//! - A destroyed item's id is not reused while anything still refers to it.
//! - Area filters and object attachment chains never form cycles.
//! - All state mutations flow through explicit [`World`] operations and are
//!   recorded in its event log.

pub mod attach;
pub mod identifier;
pub mod item;
pub mod motion;
pub mod shared;
pub mod world;

pub use attach::{AttachmentChange, AttachmentResolver};
pub use identifier::{Identifier, IdentifierError};
pub use item::{
    ActorData, Anchor, Animation, AreaData, Attachment, CheckpointData, ComparableDistance,
    Filters, Item, ItemBase, ItemDef, ItemKind, MapIconData, MaterialOverride, ObjectData,
    PickupData, RaceCheckpointData, STATIC_DISTANCE, STATIC_DISTANCE_CUTOFF, TextLabelData,
    TextMaterial, TextureMaterial,
};
pub use motion::{Motion, MotionSample};
pub use shared::{SharedHandle, SharedPool};
pub use world::{MaterialView, RegistryError, SharedCounts, World, WorldEvent};

pub fn crate_info() -> &'static str {
    "streamer-kernel v0.1.0"
}
