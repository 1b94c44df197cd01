use glam::Vec3;
use streamer_common::{ConfigError, ItemKey, ItemType, PlayerId, ScriptId, StreamerConfig};
use streamer_stream::{InteractionKind, NativeSlot, StreamError, StreamEvent, Streamer};

use crate::dispatch::{DispatchError, DispatchOutcome, Dispatcher, ScriptSink};
use crate::event::{EditResponse, ScriptEvent};

/// What a fired bullet hit, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletHit {
    Nothing,
    Player(PlayerId),
    Vehicle(streamer_common::VehicleId),
    /// A global native object, never one of ours.
    Object(NativeSlot),
    /// A per-participant native object.
    PlayerObject(NativeSlot),
}

/// The streamer as seen from the host process: native callbacks come in,
/// script events go out.
pub struct Host {
    streamer: Streamer,
    dispatcher: Dispatcher,
    tick_counter: u32,
}

impl Host {
    pub fn new(config: StreamerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            streamer: Streamer::new(config)?,
            dispatcher: Dispatcher::new(),
            tick_counter: 0,
        })
    }

    pub fn streamer(&self) -> &Streamer {
        &self.streamer
    }

    pub fn streamer_mut(&mut self) -> &mut Streamer {
        &mut self.streamer
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn register_script(&mut self, sink: Box<dyn ScriptSink>) -> Result<(), DispatchError> {
        self.dispatcher.register(sink)
    }

    /// Unregister a script and destroy every item it created.
    pub fn unload_script(&mut self, script: ScriptId) -> Vec<ItemKey> {
        self.dispatcher.unregister(script);
        let destroyed = self.streamer.edit(|w| w.destroy_script_items(script));
        tracing::debug!(script = script.0, items = destroyed.len(), "script unloaded");
        destroyed
    }

    /// Host tick. Every `tick_rate` calls run one streaming evaluation and
    /// forward its transitions to scripts.
    pub fn process_tick(&mut self, now_ms: u64) -> Vec<StreamEvent> {
        self.tick_counter += 1;
        if self.tick_counter < self.streamer.config().tick_rate {
            return Vec::new();
        }
        self.tick_counter = 0;
        let events = self.streamer.tick(now_ms);
        for event in &events {
            if let Some(script_event) = script_event_for(event) {
                self.dispatcher.dispatch(&script_event);
            }
        }
        events
    }

    pub fn on_player_connect(&mut self, player: PlayerId, position: Vec3) -> Result<(), StreamError> {
        self.streamer.connect(player, position)
    }

    /// The host has already destroyed the participant's native items, so the
    /// released slots produce no script events.
    pub fn on_player_disconnect(
        &mut self,
        player: PlayerId,
    ) -> Result<Vec<(ItemKey, NativeSlot)>, StreamError> {
        self.streamer.disconnect(player)
    }

    pub fn on_player_enter_checkpoint(
        &mut self,
        player: PlayerId,
    ) -> Result<Option<DispatchOutcome>, StreamError> {
        let entered = self.streamer.confirm_checkpoint_entered(player, ItemType::Checkpoint)?;
        Ok(entered.map(|checkpoint| {
            self.dispatcher
                .dispatch(&ScriptEvent::PlayerEnterCheckpoint { player, checkpoint })
        }))
    }

    pub fn on_player_leave_checkpoint(
        &mut self,
        player: PlayerId,
    ) -> Result<Option<DispatchOutcome>, StreamError> {
        let left = self.streamer.confirm_checkpoint_left(player, ItemType::Checkpoint)?;
        Ok(left.map(|checkpoint| {
            self.dispatcher
                .dispatch(&ScriptEvent::PlayerLeaveCheckpoint { player, checkpoint })
        }))
    }

    pub fn on_player_enter_race_checkpoint(
        &mut self,
        player: PlayerId,
    ) -> Result<Option<DispatchOutcome>, StreamError> {
        let entered = self
            .streamer
            .confirm_checkpoint_entered(player, ItemType::RaceCheckpoint)?;
        Ok(entered.map(|checkpoint| {
            self.dispatcher
                .dispatch(&ScriptEvent::PlayerEnterRaceCheckpoint { player, checkpoint })
        }))
    }

    pub fn on_player_leave_race_checkpoint(
        &mut self,
        player: PlayerId,
    ) -> Result<Option<DispatchOutcome>, StreamError> {
        let left = self
            .streamer
            .confirm_checkpoint_left(player, ItemType::RaceCheckpoint)?;
        Ok(left.map(|checkpoint| {
            self.dispatcher
                .dispatch(&ScriptEvent::PlayerLeaveRaceCheckpoint { player, checkpoint })
        }))
    }

    /// Returns `None` when the slot holds none of our pickups.
    pub fn on_player_pick_up_pickup(
        &mut self,
        player: PlayerId,
        slot: NativeSlot,
    ) -> Option<DispatchOutcome> {
        let pickup = self.streamer.resolve_slot(player, ItemType::Pickup, slot)?;
        Some(
            self.dispatcher
                .dispatch(&ScriptEvent::PlayerPickUpPickup { player, pickup }),
        )
    }

    /// Put the participant into edit or select mode on `object`, keeping it
    /// visible for the duration.
    pub fn begin_object_interaction(
        &mut self,
        player: PlayerId,
        object: streamer_common::ItemId,
        kind: InteractionKind,
    ) -> Result<(), StreamError> {
        self.streamer.begin_object_interaction(player, object, kind)
    }

    pub fn cancel_object_interaction(&mut self, player: PlayerId) -> Result<(), StreamError> {
        self.streamer.end_object_interaction(player).map(|_| ())
    }

    /// A final or cancelled response ends the participant's interaction on
    /// that object.
    pub fn on_player_edit_object(
        &mut self,
        player: PlayerId,
        slot: NativeSlot,
        response: EditResponse,
        position: Vec3,
        rotation: Vec3,
    ) -> Result<Option<DispatchOutcome>, StreamError> {
        let Some(object) = self.streamer.resolve_slot(player, ItemType::Object, slot) else {
            return Ok(None);
        };
        if response.concludes() {
            let editing = self
                .streamer
                .player(player)
                .and_then(|p| p.interaction())
                .is_some_and(|i| i.object == object);
            if editing {
                self.streamer.end_object_interaction(player)?;
            }
        }
        Ok(Some(self.dispatcher.dispatch(&ScriptEvent::PlayerEditObject {
            player,
            object,
            response,
            position,
            rotation,
        })))
    }

    pub fn on_player_select_object(
        &mut self,
        player: PlayerId,
        slot: NativeSlot,
        model: i32,
        position: Vec3,
    ) -> Option<DispatchOutcome> {
        let object = self.streamer.resolve_slot(player, ItemType::Object, slot)?;
        Some(self.dispatcher.dispatch(&ScriptEvent::PlayerSelectObject {
            player,
            object,
            model,
            position,
        }))
    }

    /// Returns whether the shot is allowed. Only hits on our shootable
    /// objects are reported; every module must allow them.
    pub fn on_player_weapon_shot(
        &mut self,
        player: PlayerId,
        weapon: i32,
        hit: BulletHit,
        position: Vec3,
    ) -> bool {
        let BulletHit::PlayerObject(slot) = hit else {
            return true;
        };
        let shootable = self
            .streamer
            .slot_attributes(player, ItemType::Object, slot)
            .is_some_and(|a| a.shootable);
        if !shootable {
            return true;
        }
        let Some(object) = self.streamer.resolve_slot(player, ItemType::Object, slot) else {
            return true;
        };
        self.dispatcher
            .dispatch(&ScriptEvent::PlayerShootObject {
                player,
                weapon,
                object,
                position,
            })
            .allowed
    }

    pub fn on_player_give_damage_actor(
        &mut self,
        player: PlayerId,
        slot: NativeSlot,
        amount: f32,
        weapon: i32,
        body_part: i32,
    ) -> Option<DispatchOutcome> {
        let actor = self.streamer.resolve_slot(player, ItemType::Actor, slot)?;
        Some(self.dispatcher.dispatch(&ScriptEvent::PlayerGiveDamageActor {
            player,
            actor,
            amount,
            weapon,
            body_part,
        }))
    }

    /// The client finished creating a native actor.
    pub fn on_actor_stream_in(&mut self, slot: NativeSlot, player: PlayerId) -> Option<DispatchOutcome> {
        let actor = self.streamer.resolve_slot(player, ItemType::Actor, slot)?;
        Some(
            self.dispatcher
                .dispatch(&ScriptEvent::ActorStreamIn { actor, player }),
        )
    }

    pub fn on_actor_stream_out(&mut self, slot: NativeSlot, player: PlayerId) -> Option<DispatchOutcome> {
        let actor = self.streamer.resolve_slot(player, ItemType::Actor, slot)?;
        Some(
            self.dispatcher
                .dispatch(&ScriptEvent::ActorStreamOut { actor, player }),
        )
    }
}

/// Streaming transitions that scripts hear about. Slot refreshes and
/// detachments stay between the streamer and the host.
fn script_event_for(event: &StreamEvent) -> Option<ScriptEvent> {
    match *event {
        StreamEvent::StreamIn {
            player,
            key,
            callbacks: true,
            ..
        } => Some(ScriptEvent::ItemStreamIn { key, player }),
        StreamEvent::StreamOut {
            player,
            key,
            callbacks: true,
            ..
        } => Some(ScriptEvent::ItemStreamOut { key, player }),
        StreamEvent::AreaEntered { player, area } => {
            Some(ScriptEvent::PlayerEnterArea { player, area })
        }
        StreamEvent::AreaLeft { player, area } => Some(ScriptEvent::PlayerLeaveArea { player, area }),
        StreamEvent::MotionFinished { key } if key.kind == ItemType::Object => {
            Some(ScriptEvent::ObjectMoved { object: key.id })
        }
        _ => None,
    }
}
