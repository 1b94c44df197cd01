use glam::Vec3;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use streamer_common::{ItemId, ItemKey, ItemType, PlayerId};
use streamer_kernel::{Anchor, SharedCounts};
use streamer_stream::{NativeSlot, Streamer};

/// Read-only queries against a streamer for debugging and profiling.
pub struct StreamerInspector;

impl StreamerInspector {
    pub fn summary(streamer: &Streamer) -> StreamerSummary {
        let world = streamer.world();
        let items = ItemType::ALL
            .into_iter()
            .map(|kind| (kind, world.item_count(kind)))
            .filter(|(_, count)| *count > 0)
            .collect();
        StreamerSummary {
            ticks: streamer.ticks(),
            players: streamer.players().count(),
            items,
            shared: world.shared_counts(),
            pending_events: streamer.pending_events().len(),
            average_tick: streamer.timer().average(),
            max_tick: streamer.timer().max(),
            per_player_tick: streamer.timer().per_player(),
        }
    }

    pub fn inspect_player(streamer: &Streamer, id: PlayerId) -> Option<PlayerInfo> {
        let player = streamer.player(id)?;
        let visible = ItemType::STREAMED
            .into_iter()
            .map(|kind| (kind, player.visible_count(kind)))
            .filter(|(_, count)| *count > 0)
            .collect();
        Some(PlayerInfo {
            id,
            position: player.position(),
            world: player.world(),
            interior: player.interior(),
            visible,
            areas: player.areas().iter().copied().collect(),
            interaction: player.interaction().map(|i| i.object),
        })
    }

    pub fn inspect_item(streamer: &Streamer, key: ItemKey) -> Option<ItemInfo> {
        let item = streamer.world().get(key)?;
        let slots = streamer
            .players()
            .filter_map(|p| p.slot_of(key).map(|slot| (p.id(), slot)))
            .collect();
        Some(ItemInfo {
            key,
            position: item.position(),
            stream_distance: item.base.stream_distance,
            priority: item.base.priority,
            references: item.references(),
            anchor: item.attachment().map(|a| a.anchor),
            slots,
        })
    }

    pub fn list_items(streamer: &Streamer, kind: ItemType) -> Vec<ItemId> {
        streamer.world().items(kind).map(|item| item.id()).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamerSummary {
    pub ticks: u64,
    pub players: usize,
    pub items: BTreeMap<ItemType, usize>,
    pub shared: SharedCounts,
    pub pending_events: usize,
    pub average_tick: Duration,
    pub max_tick: Duration,
    pub per_player_tick: Duration,
}

impl fmt::Display for StreamerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Streamer: ticks={} players={} pending_events={} avg_tick={:?} max_tick={:?} per_player={:?}",
            self.ticks,
            self.players,
            self.pending_events,
            self.average_tick,
            self.max_tick,
            self.per_player_tick
        )?;
        for (kind, count) in &self.items {
            write!(f, " {kind}={count}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub position: Vec3,
    pub world: i32,
    pub interior: i32,
    pub visible: BTreeMap<ItemType, usize>,
    pub areas: Vec<ItemId>,
    pub interaction: Option<ItemId>,
}

impl fmt::Display for PlayerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Player [{}] pos=({:.2}, {:.2}, {:.2}) world={} interior={} areas={}",
            self.id.0,
            self.position.x,
            self.position.y,
            self.position.z,
            self.world,
            self.interior,
            self.areas.len(),
        )?;
        for (kind, count) in &self.visible {
            write!(f, " {kind}={count}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemInfo {
    pub key: ItemKey,
    pub position: Vec3,
    pub stream_distance: f32,
    pub priority: i32,
    pub references: u32,
    pub anchor: Option<Anchor>,
    /// Participants currently holding the item, with their slot.
    pub slots: Vec<(PlayerId, NativeSlot)>,
}

impl fmt::Display for ItemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Item [{}] pos=({:.2}, {:.2}, {:.2}) distance={:.1} priority={} visible_to={}",
            self.key,
            self.position.x,
            self.position.y,
            self.position.z,
            self.stream_distance,
            self.priority,
            self.slots.len(),
        )?;
        if let Some(anchor) = &self.anchor {
            write!(f, " attached_to={anchor:?}")?;
        }
        Ok(())
    }
}
