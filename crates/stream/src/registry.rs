use glam::Vec3;
use std::ops::Deref;
use streamer_common::{ItemKey, ScriptId};
use streamer_kernel::{
    Animation, Attachment, Filters, Item, ItemDef, ItemKind, RegistryError, SharedHandle,
    TextMaterial, TextureMaterial, World,
};

/// Mutable view of the registry handed out by [`Streamer::edit`].
///
/// Reads go through to the [`World`]. Writes are limited to item state;
/// participant poses and the world event log belong to the streamer.
///
/// ```compile_fail
/// use streamer_common::{PlayerId, StreamerConfig};
/// use streamer_stream::Streamer;
///
/// let mut s = Streamer::new(StreamerConfig::default()).unwrap();
/// s.edit(|w| w.remove_player(PlayerId(0)));
/// ```
///
/// [`Streamer::edit`]: crate::Streamer::edit
pub struct Registry<'a> {
    world: &'a mut World,
}

impl<'a> Registry<'a> {
    pub(crate) fn new(world: &'a mut World) -> Self {
        Self { world }
    }

    pub fn create(&mut self, def: ItemDef) -> Result<ItemKey, RegistryError> {
        self.world.create(def)
    }

    pub fn destroy(&mut self, key: ItemKey) -> Result<Item, RegistryError> {
        self.world.destroy(key)
    }

    pub fn destroy_script_items(&mut self, script: ScriptId) -> Vec<ItemKey> {
        self.world.destroy_script_items(script)
    }

    pub fn set_position(&mut self, key: ItemKey, position: Vec3) -> Result<(), RegistryError> {
        self.world.set_position(key, position)
    }

    pub fn set_rotation(&mut self, key: ItemKey, rotation: Vec3) -> Result<(), RegistryError> {
        self.world.set_rotation(key, rotation)
    }

    pub fn set_stream_distance(&mut self, key: ItemKey, distance: f32) -> Result<(), RegistryError> {
        self.world.set_stream_distance(key, distance)
    }

    pub fn set_priority(&mut self, key: ItemKey, priority: i32) -> Result<(), RegistryError> {
        self.world.set_priority(key, priority)
    }

    pub fn set_filters(&mut self, key: ItemKey, filters: Filters) -> Result<(), RegistryError> {
        self.world.set_filters(key, filters)
    }

    pub fn set_stream_callbacks(&mut self, key: ItemKey, enabled: bool) -> Result<(), RegistryError> {
        self.world.set_stream_callbacks(key, enabled)
    }

    pub fn set_extras(&mut self, key: ItemKey, extras: Vec<i32>) -> Result<(), RegistryError> {
        self.world.set_extras(key, extras)
    }

    pub fn set_extra_extras(
        &mut self,
        key: ItemKey,
        index: i32,
        values: Vec<i32>,
    ) -> Result<(), RegistryError> {
        self.world.set_extra_extras(key, index, values)
    }

    pub fn update_payload(
        &mut self,
        key: ItemKey,
        edit: impl FnOnce(&mut ItemKind),
    ) -> Result<(), RegistryError> {
        self.world.update_payload(key, edit)
    }

    pub fn pin_comparable(&mut self, key: ItemKey) -> Result<bool, RegistryError> {
        self.world.pin_comparable(key)
    }

    pub fn unpin_comparable(&mut self, key: ItemKey) -> Result<bool, RegistryError> {
        self.world.unpin_comparable(key)
    }

    pub fn attach(&mut self, key: ItemKey, attachment: Attachment) -> Result<(), RegistryError> {
        self.world.attach(key, attachment)
    }

    pub fn detach(&mut self, key: ItemKey) -> Result<bool, RegistryError> {
        self.world.detach(key)
    }

    pub fn set_material_texture(
        &mut self,
        key: ItemKey,
        index: u8,
        material: TextureMaterial,
    ) -> Result<SharedHandle, RegistryError> {
        self.world.set_material_texture(key, index, material)
    }

    pub fn set_material_text(
        &mut self,
        key: ItemKey,
        index: u8,
        material: TextMaterial,
    ) -> Result<SharedHandle, RegistryError> {
        self.world.set_material_text(key, index, material)
    }

    pub fn remove_material(&mut self, key: ItemKey, index: u8) -> Result<bool, RegistryError> {
        self.world.remove_material(key, index)
    }

    pub fn copy_materials(&mut self, from: ItemKey, to: ItemKey) -> Result<usize, RegistryError> {
        self.world.copy_materials(from, to)
    }

    pub fn apply_animation(
        &mut self,
        key: ItemKey,
        animation: Animation,
    ) -> Result<SharedHandle, RegistryError> {
        self.world.apply_animation(key, animation)
    }

    pub fn clear_animation(&mut self, key: ItemKey) -> Result<bool, RegistryError> {
        self.world.clear_animation(key)
    }

    pub fn copy_animation(&mut self, from: ItemKey, to: ItemKey) -> Result<bool, RegistryError> {
        self.world.copy_animation(from, to)
    }

    /// Start moving an object. Returns the travel time in milliseconds.
    pub fn start_motion(
        &mut self,
        key: ItemKey,
        target: Vec3,
        speed: f32,
        target_rotation: Option<Vec3>,
        now_ms: u64,
    ) -> Result<u64, RegistryError> {
        self.world.start_motion(key, target, speed, target_rotation, now_ms)
    }

    pub fn stop_motion(&mut self, key: ItemKey, now_ms: u64) -> Result<bool, RegistryError> {
        self.world.stop_motion(key, now_ms)
    }
}

impl Deref for Registry<'_> {
    type Target = World;

    fn deref(&self) -> &World {
        self.world
    }
}
