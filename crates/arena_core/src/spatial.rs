//! Uniform spatial hash for broad-phase queries.
//!
//! Rebuilt from scratch every tick. Each entry is inserted into every cell
//! its bounding circle overlaps, so two circles can only touch if they share
//! at least one cell.

use std::collections::{BTreeMap, BTreeSet};

use crate::ecs::Entity;
use crate::math::{Fixed, Vec2Fixed};

type CellKey = (i32, i32);

/// Bucketed entity positions.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size: Fixed,
    buckets: BTreeMap<CellKey, Vec<Entity>>,
}

impl SpatialHash {
    /// Empty hash with the given cell edge.
    #[must_use]
    pub fn new(cell_size: Fixed) -> Self {
        let cell_size = if cell_size <= Fixed::ZERO {
            Fixed::from_num(1)
        } else {
            cell_size
        };
        Self {
            cell_size,
            buckets: BTreeMap::new(),
        }
    }

    /// Remove every entry, keeping the cell size.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.buckets.len()
    }

    fn cell_of(&self, value: Fixed) -> i32 {
        (value / self.cell_size).floor().to_num::<i32>()
    }

    fn cell_range(&self, center: Vec2Fixed, radius: Fixed) -> (CellKey, CellKey) {
        (
            (self.cell_of(center.x - radius), self.cell_of(center.y - radius)),
            (self.cell_of(center.x + radius), self.cell_of(center.y + radius)),
        )
    }

    /// Insert a circle into every cell it overlaps.
    pub fn insert(&mut self, entity: Entity, center: Vec2Fixed, radius: Fixed) {
        let ((x0, y0), (x1, y1)) = self.cell_range(center, radius);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                self.buckets.entry((cx, cy)).or_default().push(entity);
            }
        }
    }

    /// Entities sharing a cell with the circle, deduplicated, in id order.
    #[must_use]
    pub fn query_circle(&self, center: Vec2Fixed, radius: Fixed) -> Vec<Entity> {
        let ((x0, y0), (x1, y1)) = self.cell_range(center, radius);
        let mut found = BTreeSet::new();
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                if let Some(bucket) = self.buckets.get(&(cx, cy)) {
                    found.extend(bucket.iter().copied());
                }
            }
        }
        found.into_iter().collect()
    }

    /// Every pair of entities that share at least one cell.
    ///
    /// Pairs are canonical (lower id first), unique, and sorted.
    #[must_use]
    pub fn candidate_pairs(&self) -> Vec<(Entity, Entity)> {
        let mut visited = BTreeSet::new();
        for bucket in self.buckets.values() {
            for (i, &a) in bucket.iter().enumerate() {
                for &b in &bucket[i + 1..] {
                    if a == b {
                        continue;
                    }
                    visited.insert(if a < b { (a, b) } else { (b, a) });
                }
            }
        }
        visited.into_iter().collect()
    }
}
