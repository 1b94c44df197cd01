use glam::Vec3;
use serde::{Deserialize, Serialize};
use streamer_common::{ItemId, ItemKey, PlayerId};

/// Response code of an object edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditResponse {
    Cancel,
    Final,
    Update,
}

impl EditResponse {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(EditResponse::Cancel),
            1 => Some(EditResponse::Final),
            2 => Some(EditResponse::Update),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            EditResponse::Cancel => 0,
            EditResponse::Final => 1,
            EditResponse::Update => 2,
        }
    }

    /// Whether this response ends the edit session.
    pub fn concludes(self) -> bool {
        matches!(self, EditResponse::Cancel | EditResponse::Final)
    }
}

/// How a script event travels through the registered sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Every sink sees the event whatever earlier sinks answered.
    Broadcast,
    /// The first truthy answer stops propagation.
    StopOnTruthy,
    /// Every sink sees the event; the outcome allows only if all of them did.
    AllMustAllow,
}

/// Events delivered to script modules. Items are always named by dynamic id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    PlayerEnterCheckpoint {
        player: PlayerId,
        checkpoint: ItemId,
    },
    PlayerLeaveCheckpoint {
        player: PlayerId,
        checkpoint: ItemId,
    },
    PlayerEnterRaceCheckpoint {
        player: PlayerId,
        checkpoint: ItemId,
    },
    PlayerLeaveRaceCheckpoint {
        player: PlayerId,
        checkpoint: ItemId,
    },
    PlayerPickUpPickup {
        player: PlayerId,
        pickup: ItemId,
    },
    PlayerEditObject {
        player: PlayerId,
        object: ItemId,
        response: EditResponse,
        position: Vec3,
        rotation: Vec3,
    },
    PlayerSelectObject {
        player: PlayerId,
        object: ItemId,
        model: i32,
        position: Vec3,
    },
    PlayerShootObject {
        player: PlayerId,
        weapon: i32,
        object: ItemId,
        position: Vec3,
    },
    PlayerGiveDamageActor {
        player: PlayerId,
        actor: ItemId,
        amount: f32,
        weapon: i32,
        body_part: i32,
    },
    ActorStreamIn {
        actor: ItemId,
        player: PlayerId,
    },
    ActorStreamOut {
        actor: ItemId,
        player: PlayerId,
    },
    PlayerEnterArea {
        player: PlayerId,
        area: ItemId,
    },
    PlayerLeaveArea {
        player: PlayerId,
        area: ItemId,
    },
    ItemStreamIn {
        key: ItemKey,
        player: PlayerId,
    },
    ItemStreamOut {
        key: ItemKey,
        player: PlayerId,
    },
    ObjectMoved {
        object: ItemId,
    },
}

impl ScriptEvent {
    pub fn propagation(&self) -> Propagation {
        match self {
            ScriptEvent::PlayerEditObject { .. }
            | ScriptEvent::PlayerSelectObject { .. }
            | ScriptEvent::PlayerGiveDamageActor { .. } => Propagation::StopOnTruthy,
            ScriptEvent::PlayerShootObject { .. } => Propagation::AllMustAllow,
            _ => Propagation::Broadcast,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScriptEvent::PlayerEnterCheckpoint { .. } => "player_enter_checkpoint",
            ScriptEvent::PlayerLeaveCheckpoint { .. } => "player_leave_checkpoint",
            ScriptEvent::PlayerEnterRaceCheckpoint { .. } => "player_enter_race_checkpoint",
            ScriptEvent::PlayerLeaveRaceCheckpoint { .. } => "player_leave_race_checkpoint",
            ScriptEvent::PlayerPickUpPickup { .. } => "player_pick_up_pickup",
            ScriptEvent::PlayerEditObject { .. } => "player_edit_object",
            ScriptEvent::PlayerSelectObject { .. } => "player_select_object",
            ScriptEvent::PlayerShootObject { .. } => "player_shoot_object",
            ScriptEvent::PlayerGiveDamageActor { .. } => "player_give_damage_actor",
            ScriptEvent::ActorStreamIn { .. } => "actor_stream_in",
            ScriptEvent::ActorStreamOut { .. } => "actor_stream_out",
            ScriptEvent::PlayerEnterArea { .. } => "player_enter_area",
            ScriptEvent::PlayerLeaveArea { .. } => "player_leave_area",
            ScriptEvent::ItemStreamIn { .. } => "item_stream_in",
            ScriptEvent::ItemStreamOut { .. } => "item_stream_out",
            ScriptEvent::ObjectMoved { .. } => "object_moved",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_response_codes() {
        for response in [EditResponse::Cancel, EditResponse::Final, EditResponse::Update] {
            assert_eq!(EditResponse::from_code(response.code()), Some(response));
        }
        assert_eq!(EditResponse::from_code(7), None);
        assert!(EditResponse::Final.concludes());
        assert!(!EditResponse::Update.concludes());
    }

    #[test]
    fn propagation_per_event() {
        let p = PlayerId(0);
        let id = ItemId(1);
        let pickup = ScriptEvent::PlayerPickUpPickup { player: p, pickup: id };
        assert_eq!(pickup.propagation(), Propagation::Broadcast);
        let select = ScriptEvent::PlayerSelectObject {
            player: p,
            object: id,
            model: 1,
            position: Vec3::ZERO,
        };
        assert_eq!(select.propagation(), Propagation::StopOnTruthy);
        let shot = ScriptEvent::PlayerShootObject {
            player: p,
            weapon: 24,
            object: id,
            position: Vec3::ZERO,
        };
        assert_eq!(shot.propagation(), Propagation::AllMustAllow);
        assert_eq!(shot.name(), "player_shoot_object");
    }

    #[test]
    fn events_serialize_with_their_name() {
        let event = ScriptEvent::ObjectMoved { object: ItemId(3) };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(&format!("\"event\":\"{}\"", event.name())));
    }
}
