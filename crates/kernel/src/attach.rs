use glam::Vec3;
use std::collections::BTreeSet;
use streamer_common::{ItemKey, ItemType, euler_to_quat, quat_to_euler};

use crate::item::{Anchor, Attachment};
use crate::world::World;

/// Outcome of resolving one attached item.
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentChange {
    Moved { key: ItemKey, position: Vec3 },
    /// The anchor vanished; the item fell back to `position`.
    Detached {
        key: ItemKey,
        anchor: Anchor,
        position: Vec3,
    },
}

/// Keeps attached items positioned relative to their anchors.
pub struct AttachmentResolver;

impl AttachmentResolver {
    /// Recompute every attached item from its anchor's current pose.
    /// Anchors that are themselves attached are resolved first.
    pub fn resolve_all(world: &mut World) -> Vec<AttachmentChange> {
        let mut changes = Vec::new();
        let mut done = BTreeSet::new();
        for key in world.attached_items() {
            Self::resolve_chain(world, key, &mut done, &mut changes);
        }
        if !changes.is_empty() {
            tracing::trace!(changes = changes.len(), "attachments resolved");
        }
        changes
    }

    fn resolve_chain(
        world: &mut World,
        key: ItemKey,
        done: &mut BTreeSet<ItemKey>,
        changes: &mut Vec<AttachmentChange>,
    ) {
        let mut chain = vec![key];
        let mut cursor = key;
        while let Some(Attachment {
            anchor: Anchor::Object(id),
            ..
        }) = world.get(cursor).and_then(|item| item.attachment())
        {
            let next = ItemKey::new(ItemType::Object, *id);
            if done.contains(&next) || chain.contains(&next) {
                break;
            }
            chain.push(next);
            cursor = next;
        }
        for key in chain.into_iter().rev() {
            if done.insert(key) {
                changes.extend(Self::resolve(world, key));
            }
        }
    }

    /// Recompute one attached item. `None` when nothing changed.
    pub fn resolve(world: &mut World, key: ItemKey) -> Option<AttachmentChange> {
        let attachment = world.get(key)?.attachment()?.clone();
        let Some(pose) = world.anchor_pose(&attachment.anchor) else {
            tracing::debug!(%key, anchor = ?attachment.anchor, "anchor gone, detaching");
            let torn = world.detach_dangling(key).ok()??;
            return Some(AttachmentChange::Detached {
                key,
                anchor: torn.anchor,
                position: torn.rest_position,
            });
        };

        let (position, rotation) = if attachment.sync_rotation {
            let rotation = pose.rotation * euler_to_quat(attachment.rotation);
            (pose.transform_point(attachment.offset), quat_to_euler(rotation))
        } else {
            (pose.position + attachment.offset, attachment.rotation)
        };
        world
            .place_attached(key, position, rotation)
            .then_some(AttachmentChange::Moved { key, position })
    }
}
