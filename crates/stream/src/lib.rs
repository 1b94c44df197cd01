//! Streaming: decides which items each participant sees.
//!
//! Items are indexed in a fixed-size cell grid per type. Every tick the
//! [`Streamer`] resolves attachments, re-indexes moved items and then, per
//! participant, computes area containment, ranks nearby candidates and
//! diffs the best of them against the participant's slot tables.
//!
//! # Invariants
//! - A participant never holds more items of a type than that type's capacity.
//! - An item that stays selected keeps its slot.
//! - Selection is a total order over (distance, priority, incumbency, id), so
//!   repeated evaluation of unchanged input is identical.
//! - A participant's evaluation never touches another participant's state.

pub mod areas;
mod event;
mod grid;
mod player;
pub mod rank;
mod registry;
mod scheduler;
mod slots;
mod stats;

pub use event::StreamEvent;
pub use grid::{CellCoord, CellIndex, Footprint};
pub use player::{CheckpointState, InteractionKind, ObjectInteraction, PlayerState};
pub use registry::Registry;
pub use scheduler::{StreamError, Streamer};
pub use slots::{NativeSlot, SlotAttributes, SlotError, SlotTable};
pub use stats::{StreamStats, TickSample, TickTimer};

pub fn crate_info() -> &'static str {
    "streamer-stream v0.1.0"
}
