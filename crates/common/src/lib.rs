//! Shared types for the item streamer: identifiers, item kinds, player masks,
//! area geometry and configuration.
//!
//! # Invariants
//! - Identifiers are plain values; every cross-reference between items is an id,
//!   resolved through the owning registry.
//! - Shape containment is pure and allocation-free.

pub mod config;
pub mod geometry;
pub mod types;

pub use config::{ConfigError, ItemLimits, StreamerConfig};
pub use geometry::{Bounds2, Shape, ShapeError};
pub use types::{
    ItemId, ItemKey, ItemType, MAX_PLAYERS, PlayerId, PlayerMask, Pose, ScriptId, VehicleId,
    euler_to_quat, quat_to_euler,
};

pub fn crate_info() -> &'static str {
    "streamer-common v0.1.0"
}
