//! Hex geometry with axial coordinates

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Direction vectors in axial coordinates.
///
/// The order is fixed: breadth-first searches visit neighbors in this order,
/// which makes equal-distance tie-breaks deterministic.
pub const DIRECTIONS: [(i32, i32); 6] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
];

/// Axial hex coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
}

impl Hex {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Derived third cube coordinate, widened so any axial pair is representable
    pub const fn s(&self) -> i64 {
        -(self.q as i64) - self.r as i64
    }

    /// Check if this hex lies inside a hexagonal region of the given radius
    pub fn within_radius(&self, radius: i32) -> bool {
        let radius = i64::from(radius);
        i64::from(self.q).abs() <= radius && i64::from(self.r).abs() <= radius && self.s().abs() <= radius
    }

    /// Distance between two hexes, saturating at `i32::MAX`
    pub fn distance_to(&self, other: Hex) -> i32 {
        let dq = (i64::from(self.q) - i64::from(other.q)).abs();
        let dr = (i64::from(self.r) - i64::from(other.r)).abs();
        let ds = (self.s() - other.s()).abs();
        i32::try_from((dq + dr + ds) / 2).unwrap_or(i32::MAX)
    }

    pub fn is_adjacent(&self, other: Hex) -> bool {
        self.distance_to(other) == 1
    }

    /// Get neighbor in direction (0-5)
    pub fn neighbor(&self, direction: usize) -> Hex {
        let (dq, dr) = DIRECTIONS[direction % 6];
        Hex::new(self.q.saturating_add(dq), self.r.saturating_add(dr))
    }

    /// All six neighbors in `DIRECTIONS` order, on or off any board
    pub fn neighbors(&self) -> [Hex; 6] {
        std::array::from_fn(|dir| self.neighbor(dir))
    }
}

impl std::fmt::Display for Hex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// All hexes of a hexagonal region, ordered by (q, r)
pub fn hex_region(radius: i32) -> Vec<Hex> {
    let mut hexes = Vec::new();
    for q in -radius..=radius {
        for r in -radius..=radius {
            let hex = Hex::new(q, r);
            if hex.within_radius(radius) {
                hexes.push(hex);
            }
        }
    }
    hexes
}

/// Number of cells in a hexagonal region: 3r(r+1) + 1
pub const fn region_size(radius: i32) -> usize {
    (3 * radius * (radius + 1) + 1) as usize
}

/// First step from `start` toward the nearest hex (other than `start`)
/// satisfying `goal`.
///
/// Breadth-first over hexes for which `exists` holds. Returns `None` when no
/// reachable hex satisfies the goal.
pub fn step_toward<E, G>(start: Hex, exists: E, goal: G) -> Option<Hex>
where
    E: Fn(Hex) -> bool,
    G: Fn(Hex) -> bool,
{
    let mut parent: FxHashMap<Hex, Hex> = FxHashMap::default();
    let mut seen: FxHashSet<Hex> = FxHashSet::default();
    let mut queue = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if current != start && goal(current) {
            // Walk back to the hex adjacent to start
            let mut step = current;
            while let Some(&prev) = parent.get(&step) {
                if prev == start {
                    return Some(step);
                }
                step = prev;
            }
            return Some(step);
        }

        for next in current.neighbors() {
            if exists(next) && seen.insert(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    None
}
