//! Board: fixed hexagonal region of typed, claimable cells

use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::hex::{hex_region, step_toward, Hex};
use crate::player::ParticipantId;

/// Cell terrain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Normal,
    /// Grants a one-time energy bonus to the first visitor
    Resource,
}

/// A single board cell
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellKind,
    pub owner: Option<ParticipantId>,
    pub resource_consumed: bool,
    /// Fortification level; resting here grants shield
    pub defense: i32,
}

impl Cell {
    fn new(kind: CellKind) -> Self {
        Self {
            kind,
            owner: None,
            resource_consumed: false,
            defense: 0,
        }
    }
}

/// The six region vertices, in spawn order
pub fn spawn_points(radius: i32) -> [Hex; 6] {
    [
        Hex::new(0, -radius),      // Top
        Hex::new(radius, -radius), // Top-right
        Hex::new(radius, 0),       // Bottom-right
        Hex::new(0, radius),       // Bottom
        Hex::new(-radius, radius), // Bottom-left
        Hex::new(-radius, 0),      // Top-left
    ]
}

/// Board state. The set of cells and their kinds never change after creation.
#[derive(Clone, Debug)]
pub struct Board {
    radius: i32,
    cells: FxHashMap<Hex, Cell>,
    /// Cell coordinates in (q, r) order, for deterministic iteration
    order: Vec<Hex>,
}

impl Board {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Generate a board: spawn vertices are always normal, every other cell is
    /// a resource cell with probability `resource_probability`.
    pub fn generate<R: Rng>(radius: i32, resource_probability: f64, rng: &mut R) -> Self {
        let spawns = spawn_points(radius);
        Self::build(radius, |hex| {
            if spawns.contains(&hex) || !rng.gen_bool(resource_probability) {
                CellKind::Normal
            } else {
                CellKind::Resource
            }
        })
    }

    /// Board where every cell is normal
    pub fn plain(radius: i32) -> Self {
        Self::build(radius, |_| CellKind::Normal)
    }

    fn build(radius: i32, mut kind_of: impl FnMut(Hex) -> CellKind) -> Self {
        let order = hex_region(radius);
        let cells = order.iter().map(|&hex| (hex, Cell::new(kind_of(hex)))).collect();
        Self { radius, cells, order }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, hex: Hex) -> bool {
        self.cells.contains_key(&hex)
    }

    pub fn get(&self, hex: Hex) -> Option<&Cell> {
        self.cells.get(&hex)
    }

    pub fn owner(&self, hex: Hex) -> Option<ParticipantId> {
        self.cells.get(&hex).and_then(|cell| cell.owner)
    }

    /// Iterate cells in (q, r) order
    pub fn cells(&self) -> impl Iterator<Item = (Hex, &Cell)> + '_ {
        self.order.iter().filter_map(|hex| self.cells.get(hex).map(|cell| (*hex, cell)))
    }

    /// Neighbors of `hex` that exist on the board, in direction order
    pub fn neighbors(&self, hex: Hex) -> impl Iterator<Item = Hex> + '_ {
        hex.neighbors().into_iter().filter(|n| self.contains(*n))
    }

    /// Cells within `range` of `center`
    pub fn within(&self, center: Hex, range: i32) -> impl Iterator<Item = Hex> + '_ {
        self.order
            .iter()
            .copied()
            .filter(move |hex| hex.distance_to(center) <= range)
    }

    // ========================================================================
    // OWNERSHIP & RESOURCES
    // ========================================================================

    /// Claim a cell. Fails if it belongs to a different participant.
    pub fn claim(&mut self, hex: Hex, participant: ParticipantId) -> Result<(), ActionError> {
        let cell = self.cells.get_mut(&hex).ok_or(ActionError::NoSuchCell(hex))?;
        match cell.owner {
            Some(owner) if owner != participant => Err(ActionError::OwnedByOther { cell: hex, owner }),
            _ => {
                cell.owner = Some(participant);
                Ok(())
            }
        }
    }

    /// Clear ownership unconditionally
    pub fn release(&mut self, hex: Hex) {
        if let Some(cell) = self.cells.get_mut(&hex) {
            cell.owner = None;
        }
    }

    /// Take the one-time resource bonus. Returns true only the first time a
    /// resource cell is consumed.
    pub fn consume_resource_bonus(&mut self, hex: Hex) -> bool {
        match self.cells.get_mut(&hex) {
            Some(cell) if cell.kind == CellKind::Resource && !cell.resource_consumed => {
                cell.resource_consumed = true;
                true
            }
            _ => false,
        }
    }

    /// Raise a cell's fortification level
    pub fn fortify(&mut self, hex: Hex, level: i32) {
        if let Some(cell) = self.cells.get_mut(&hex) {
            cell.defense = cell.defense.max(level);
        }
    }

    /// Force a cell's kind. Only used to set up fixed layouts before play.
    pub fn with_kind(mut self, hex: Hex, kind: CellKind) -> Self {
        if let Some(cell) = self.cells.get_mut(&hex) {
            cell.kind = kind;
        }
        self
    }

    // ========================================================================
    // PATHFINDING
    // ========================================================================

    /// First step from `start` toward the nearest cell satisfying `goal`
    pub fn step_toward(&self, start: Hex, goal: impl Fn(Hex, &Cell) -> bool) -> Option<Hex> {
        step_toward(
            start,
            |hex| self.contains(hex),
            |hex| self.cells.get(&hex).is_some_and(|cell| goal(hex, cell)),
        )
    }

    /// First step toward the nearest unowned cell
    pub fn step_toward_unowned(&self, start: Hex) -> Option<Hex> {
        self.step_toward(start, |_, cell| cell.owner.is_none())
    }
}
