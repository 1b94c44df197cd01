use glam::Vec3;
use serde::{Deserialize, Serialize};
use streamer_common::{ItemId, ItemKey, PlayerId};

use crate::slots::NativeSlot;

/// Instructions and notifications the streamer hands to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Create the native copy of `key` in `slot`.
    StreamIn {
        player: PlayerId,
        key: ItemKey,
        slot: NativeSlot,
        /// The item asked for stream callbacks.
        callbacks: bool,
    },
    /// Destroy the native copy held in `slot`.
    StreamOut {
        player: PlayerId,
        key: ItemKey,
        slot: NativeSlot,
        callbacks: bool,
    },
    /// A visible item changed in place; refresh the native copy.
    Updated {
        player: PlayerId,
        key: ItemKey,
        slot: NativeSlot,
    },
    AreaEntered {
        player: PlayerId,
        area: ItemId,
    },
    AreaLeft {
        player: PlayerId,
        area: ItemId,
    },
    /// An attachment was torn down because its anchor vanished.
    Detached {
        key: ItemKey,
        position: Vec3,
    },
    MotionFinished {
        key: ItemKey,
    },
}

impl StreamEvent {
    /// Participant the event is addressed to, if any.
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            StreamEvent::StreamIn { player, .. }
            | StreamEvent::StreamOut { player, .. }
            | StreamEvent::Updated { player, .. }
            | StreamEvent::AreaEntered { player, .. }
            | StreamEvent::AreaLeft { player, .. } => Some(*player),
            StreamEvent::Detached { .. } | StreamEvent::MotionFinished { .. } => None,
        }
    }
}
