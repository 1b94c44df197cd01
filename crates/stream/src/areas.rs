//! Area containment: which areas a participant is inside.

use glam::Vec3;
use std::collections::{BTreeMap, BTreeSet};
use streamer_common::{ItemId, ItemKey, ItemType};
use streamer_kernel::{ItemKind, World};

use crate::grid::CellIndex;
use crate::player::PlayerState;

/// Areas whose shape contains `point`, ignoring filters.
pub fn areas_at_point(world: &World, index: &CellIndex, point: Vec3) -> BTreeSet<ItemId> {
    index
        .query(point.truncate(), 0.0)
        .into_iter()
        .filter(|id| is_point_in_area(world, *id, point))
        .collect()
}

pub fn is_point_in_area(world: &World, area: ItemId, point: Vec3) -> bool {
    world
        .get(ItemKey::new(ItemType::Area, area))
        .and_then(|item| item.shape())
        .is_some_and(|shape| shape.contains(point))
}

/// Areas containing the participant after every filter, including the
/// areas' own area filters.
pub fn containing_areas(world: &World, index: &CellIndex, player: &PlayerState) -> BTreeSet<ItemId> {
    let point = player.position;
    let raw: BTreeSet<ItemId> = index
        .query(point.truncate(), 0.0)
        .into_iter()
        .filter(|id| {
            let Some(item) = world.get(ItemKey::new(ItemType::Area, *id)) else {
                return false;
            };
            let ItemKind::Area(area) = &item.kind else {
                return false;
            };
            item.base
                .filters
                .admits_player(player.id, player.world, player.interior)
                && !(player.spectating && !area.spectate_mode)
                && area.effective.contains(point)
        })
        .collect();

    let mut memo = BTreeMap::new();
    let mut visiting = BTreeSet::new();
    raw.iter()
        .copied()
        .filter(|id| admitted(world, *id, &raw, &mut memo, &mut visiting))
        .collect()
}

/// Resolve an area's own area filter against the other areas' results.
fn admitted(
    world: &World,
    id: ItemId,
    raw: &BTreeSet<ItemId>,
    memo: &mut BTreeMap<ItemId, bool>,
    visiting: &mut BTreeSet<ItemId>,
) -> bool {
    if let Some(known) = memo.get(&id) {
        return *known;
    }
    // The registry rejects cycles; `visiting` keeps a corrupted graph from recursing forever.
    if !raw.contains(&id) || !visiting.insert(id) {
        return false;
    }
    let result = match world.get(ItemKey::new(ItemType::Area, id)) {
        Some(item) => {
            let filters = &item.base.filters;
            let inside: BTreeSet<ItemId> = filters
                .areas
                .iter()
                .copied()
                .filter(|other| admitted(world, *other, raw, memo, visiting))
                .collect();
            filters.admits_areas(&inside)
        }
        None => false,
    };
    visiting.remove(&id);
    memo.insert(id, result);
    result
}

/// Difference between two containment sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaDiff {
    pub entered: Vec<ItemId>,
    pub left: Vec<ItemId>,
}

impl AreaDiff {
    pub fn between(before: &BTreeSet<ItemId>, after: &BTreeSet<ItemId>) -> Self {
        Self {
            entered: after.difference(before).copied().collect(),
            left: before.difference(after).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.left.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Footprint;
    use glam::Vec2;
    use streamer_common::{PlayerId, Shape, StreamerConfig};
    use streamer_kernel::ItemDef;

    struct Fixture {
        world: World,
        index: CellIndex,
        config: StreamerConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                world: World::new(),
                index: CellIndex::new(300.0, 16),
                config: StreamerConfig::default(),
            }
        }

        fn add(&mut self, def: ItemDef) -> ItemId {
            let key = self.world.create(def).unwrap();
            let footprint = Footprint::of(self.world.get(key).unwrap());
            self.index.insert(key.id, footprint);
            key.id
        }

        fn player_at(&self, position: Vec3) -> PlayerState {
            PlayerState::new(PlayerId(0), position, &self.config)
        }
    }

    fn circle(x: f32, y: f32, radius: f32) -> ItemDef {
        ItemDef::area(Shape::Circle {
            center: Vec2::new(x, y),
            radius,
        })
    }

    #[test]
    fn containment_uses_shape_test() {
        let mut f = Fixture::new();
        let near = f.add(circle(0.0, 0.0, 10.0));
        let box_area = f.add(ItemDef::area(Shape::Cuboid {
            min: Vec3::new(-5.0, -5.0, 0.0),
            max: Vec3::new(5.0, 5.0, 3.0),
        }));
        let inside = containing_areas(&f.world, &f.index, &f.player_at(Vec3::new(1.0, 1.0, 1.0)));
        assert_eq!(inside, BTreeSet::from([near, box_area]));

        let high = containing_areas(&f.world, &f.index, &f.player_at(Vec3::new(1.0, 1.0, 10.0)));
        assert_eq!(high, BTreeSet::from([near]));
    }

    #[test]
    fn nested_area_requires_outer() {
        let mut f = Fixture::new();
        let outer = f.add(circle(0.0, 0.0, 5.0));
        let inner = f.add(circle(8.0, 0.0, 5.0).areas([outer]));

        // Inside both shapes.
        let both = containing_areas(&f.world, &f.index, &f.player_at(Vec3::new(4.0, 0.0, 0.0)));
        assert_eq!(both, BTreeSet::from([outer, inner]));
        // Inside only the inner shape: the area filter rejects it.
        let only_inner = containing_areas(&f.world, &f.index, &f.player_at(Vec3::new(11.0, 0.0, 0.0)));
        assert!(only_inner.is_empty());
    }

    #[test]
    fn inverse_area_filter() {
        let mut f = Fixture::new();
        let outer = f.add(circle(0.0, 0.0, 5.0));
        let inner = f.add(circle(8.0, 0.0, 5.0).areas([outer]).inverse_area_checking(true));
        let only_inner = containing_areas(&f.world, &f.index, &f.player_at(Vec3::new(11.0, 0.0, 0.0)));
        assert_eq!(only_inner, BTreeSet::from([inner]));
    }

    #[test]
    fn spectators_skip_non_spectate_areas() {
        let mut f = Fixture::new();
        let key_id = f.add(circle(0.0, 0.0, 5.0));
        f.world
            .update_payload(ItemKey::new(ItemType::Area, key_id), |kind| {
                if let ItemKind::Area(a) = kind {
                    a.spectate_mode = false;
                }
            })
            .unwrap();
        let mut p = f.player_at(Vec3::ZERO);
        assert_eq!(containing_areas(&f.world, &f.index, &p).len(), 1);
        p.spectating = true;
        assert!(containing_areas(&f.world, &f.index, &p).is_empty());
    }

    #[test]
    fn world_filter_applies_to_areas() {
        let mut f = Fixture::new();
        f.add(circle(0.0, 0.0, 5.0).worlds([7]));
        let mut p = f.player_at(Vec3::ZERO);
        assert!(containing_areas(&f.world, &f.index, &p).is_empty());
        p.world = 7;
        assert_eq!(containing_areas(&f.world, &f.index, &p).len(), 1);
    }

    #[test]
    fn point_queries_ignore_filters() {
        let mut f = Fixture::new();
        let a = f.add(circle(0.0, 0.0, 5.0).worlds([7]));
        assert!(is_point_in_area(&f.world, a, Vec3::new(3.0, 0.0, 0.0)));
        assert_eq!(
            areas_at_point(&f.world, &f.index, Vec3::new(3.0, 0.0, 0.0)),
            BTreeSet::from([a])
        );
        assert!(!is_point_in_area(&f.world, ItemId(99), Vec3::ZERO));
    }

    #[test]
    fn diff_reports_entered_and_left() {
        let before = BTreeSet::from([ItemId(1), ItemId(2)]);
        let after = BTreeSet::from([ItemId(2), ItemId(3)]);
        let diff = AreaDiff::between(&before, &after);
        assert_eq!(diff.entered, vec![ItemId(3)]);
        assert_eq!(diff.left, vec![ItemId(1)]);
        assert!(AreaDiff::between(&after, &after).is_empty());
    }
}
