use glam::Vec2;
use std::collections::{BTreeMap, BTreeSet};
use streamer_common::{Bounds2, ItemId};
use streamer_kernel::Item;

/// A 2D cell coordinate in the horizontal (x, y) plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Horizontal region an item can be seen from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Footprint {
    Bounds(Bounds2),
    /// Visible from anywhere; lives in the global bucket.
    Global,
}

impl Footprint {
    /// Areas cover their shape's bounds, static items cover everything,
    /// everything else covers `position ± stream_distance`.
    pub fn of(item: &Item) -> Self {
        if let Some(shape) = item.shape() {
            return Footprint::Bounds(shape.bounds());
        }
        if item.base.comparable.is_static() || !item.base.stream_distance.is_finite() {
            return Footprint::Global;
        }
        Footprint::Bounds(Bounds2::around(
            item.position().truncate(),
            item.base.stream_distance.max(0.0),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Cells { min: CellCoord, max: CellCoord },
    Global,
}

/// Fixed-size grid over the horizontal plane, one per item type.
///
/// An item occupies every cell its footprint overlaps, so a query only has
/// to look at the cells around the viewer. Footprints wider than
/// `max_footprint_cells` along either axis go to a global bucket that every
/// query returns.
#[derive(Debug, Clone)]
pub struct CellIndex {
    cell_size: f32,
    max_footprint_cells: usize,
    cells: BTreeMap<CellCoord, BTreeSet<ItemId>>,
    placements: BTreeMap<ItemId, Placement>,
    global: BTreeSet<ItemId>,
}

impl CellIndex {
    pub fn new(cell_size: f32, max_footprint_cells: usize) -> Self {
        assert!(cell_size > 0.0, "cell_size must be positive");
        Self {
            cell_size,
            max_footprint_cells: max_footprint_cells.max(1),
            cells: BTreeMap::new(),
            placements: BTreeMap::new(),
            global: BTreeSet::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Convert a horizontal position to a cell coordinate.
    pub fn position_to_cell(&self, pos: Vec2) -> CellCoord {
        CellCoord {
            x: (pos.x / self.cell_size).floor() as i32,
            y: (pos.y / self.cell_size).floor() as i32,
        }
    }

    fn placement(&self, footprint: Footprint) -> Placement {
        let Footprint::Bounds(bounds) = footprint else {
            return Placement::Global;
        };
        let min = self.position_to_cell(bounds.min);
        let max = self.position_to_cell(bounds.max);
        let wide = i64::from(max.x) - i64::from(min.x) + 1;
        let tall = i64::from(max.y) - i64::from(min.y) + 1;
        let limit = self.max_footprint_cells as i64;
        if wide > limit || tall > limit {
            Placement::Global
        } else {
            Placement::Cells { min, max }
        }
    }

    /// Place an item. An item already present is relocated.
    pub fn insert(&mut self, id: ItemId, footprint: Footprint) {
        let placement = self.placement(footprint);
        if let Some(current) = self.placements.get(&id) {
            if *current == placement {
                return;
            }
            self.remove(id);
        }
        match placement {
            Placement::Global => {
                self.global.insert(id);
            }
            Placement::Cells { min, max } => {
                for x in min.x..=max.x {
                    for y in min.y..=max.y {
                        self.cells.entry(CellCoord::new(x, y)).or_default().insert(id);
                    }
                }
            }
        }
        self.placements.insert(id, placement);
    }

    /// Remove an item. Returns false if it was not indexed.
    pub fn remove(&mut self, id: ItemId) -> bool {
        let Some(placement) = self.placements.remove(&id) else {
            return false;
        };
        match placement {
            Placement::Global => {
                self.global.remove(&id);
            }
            Placement::Cells { min, max } => {
                for x in min.x..=max.x {
                    for y in min.y..=max.y {
                        let coord = CellCoord::new(x, y);
                        if let Some(ids) = self.cells.get_mut(&coord) {
                            ids.remove(&id);
                            if ids.is_empty() {
                                self.cells.remove(&coord);
                            }
                        }
                    }
                }
            }
        }
        true
    }

    /// Move an item to a new footprint in one step.
    pub fn relocate(&mut self, id: ItemId, footprint: Footprint) {
        self.insert(id, footprint);
    }

    /// Items whose footprint overlaps the square of `radius` around `center`,
    /// plus every global item. Sorted by id.
    pub fn query(&self, center: Vec2, radius: f32) -> BTreeSet<ItemId> {
        let radius = radius.max(0.0);
        let min = self.position_to_cell(center - Vec2::splat(radius));
        let max = self.position_to_cell(center + Vec2::splat(radius));
        let mut result = self.global.clone();
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                if let Some(ids) = self.cells.get(&CellCoord::new(x, y)) {
                    result.extend(ids);
                }
            }
        }
        result
    }

    /// Whether the item's footprint covers the cell containing `point`.
    pub fn covers(&self, id: ItemId, point: Vec2) -> bool {
        match self.placements.get(&id) {
            Some(Placement::Global) => true,
            Some(Placement::Cells { min, max }) => {
                let cell = self.position_to_cell(point);
                (min.x..=max.x).contains(&cell.x) && (min.y..=max.y).contains(&cell.y)
            }
            None => false,
        }
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.placements.contains_key(&id)
    }

    /// Occupied cells with their item counts, in coordinate order.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (CellCoord, usize)> + '_ {
        self.cells.iter().map(|(coord, ids)| (*coord, ids.len()))
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Total number of item placements across all cells.
    pub fn total_placements(&self) -> usize {
        self.cells.values().map(|s| s.len()).sum()
    }

    pub fn global_count(&self) -> usize {
        self.global.len()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.placements.clear();
        self.global.clear();
    }
}
