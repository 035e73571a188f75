//! Participant state and vision

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::board::Board;
use crate::config::MatchConfig;
use crate::hex::Hex;

// ============================================================================
// CONSTANTS
// ============================================================================

pub const MAX_HEALTH: i32 = 100;
pub const MAX_SHIELD: i32 = 20;
pub const MAX_PROGRESS: f64 = 100.0;

/// Length of the recent-action window
pub const RECENT_ACTIONS: usize = 5;

/// Invalid moves that disqualify a participant
pub const STRIKE_LIMIT: u32 = 3;

const COLORS: [&str; 6] = ["red", "blue", "green", "yellow", "orange", "purple"];

// ============================================================================
// CORE TYPES
// ============================================================================

pub type ParticipantId = u8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Alive,
    Eliminated,
    Winner,
    /// Survived to the end but lost the timeout ranking
    LostByTiebreak,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationReason {
    Combat,
    HealthDepleted,
    EnergyDepleted,
    IllegalMoves,
    Timeout,
    /// Another participant solved the objective
    Outplayed,
}

impl std::fmt::Display for EliminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            EliminationReason::Combat => "eliminated in combat",
            EliminationReason::HealthDepleted => "health depleted",
            EliminationReason::EnergyDepleted => "energy depleted",
            EliminationReason::IllegalMoves => "repeated illegal moves (3 strikes)",
            EliminationReason::Timeout => "timeout",
            EliminationReason::Outplayed => "objective solved by another participant",
        };
        f.write_str(text)
    }
}

/// Authoritative per-match participant record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub color: String,
    pub position: Hex,

    pub energy: i32,
    pub max_energy: i32,
    pub health: i32,
    pub shield: i32,
    pub status: Status,
    pub elimination: Option<EliminationReason>,

    // Combat
    pub attack_power: i32,
    pub defense_power: i32,
    pub kills: u32,
    pub defending: bool,

    // Objective
    pub objective_progress: f64,
    pub objective_attempts: u32,
    pub hints: Vec<String>,

    // Territory
    pub territories: BTreeSet<Hex>,
    /// Permanent per-claim counter; never decremented on release
    pub territory_income: i32,

    // Vision
    pub vision_range: i32,
    pub visible_cells: BTreeSet<Hex>,
    pub visible_peers: BTreeSet<ParticipantId>,
    pub explored: BTreeSet<Hex>,

    // Stall tracking
    pub idle_streak: u32,
    pub recent_actions: VecDeque<ActionKind>,
    pub invalid_move_strikes: u32,
    pub actions_taken: u32,
}

impl Participant {
    pub fn new(id: ParticipantId, position: Hex, config: &MatchConfig) -> Self {
        Self {
            id,
            name: format!("Player {}", id),
            color: color_for(id).to_string(),
            position,
            energy: config.starting_energy,
            max_energy: config.max_energy,
            health: config.starting_health.min(MAX_HEALTH),
            shield: 0,
            status: Status::Alive,
            elimination: None,
            attack_power: config.attack_power,
            defense_power: config.defense_power,
            kills: 0,
            defending: false,
            objective_progress: 0.0,
            objective_attempts: 0,
            hints: Vec::new(),
            territories: BTreeSet::new(),
            territory_income: 0,
            vision_range: config.vision_range,
            visible_cells: BTreeSet::new(),
            visible_peers: BTreeSet::new(),
            explored: BTreeSet::new(),
            idle_streak: 0,
            recent_actions: VecDeque::with_capacity(RECENT_ACTIONS),
            invalid_move_strikes: 0,
            actions_taken: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == Status::Alive
    }

    pub fn territory_count(&self) -> usize {
        self.territories.len()
    }

    /// Most recently recorded action kind
    pub fn last_action(&self) -> Option<ActionKind> {
        self.recent_actions.back().copied()
    }

    pub fn record_action(&mut self, kind: ActionKind) {
        if self.recent_actions.len() == RECENT_ACTIONS {
            self.recent_actions.pop_front();
        }
        self.recent_actions.push_back(kind);
    }

    /// Add energy, capped at max. Returns the amount actually gained.
    pub fn gain_energy(&mut self, amount: i32) -> i32 {
        let before = self.energy;
        self.energy = (self.energy + amount).min(self.max_energy);
        self.energy - before
    }

    pub fn heal(&mut self, amount: i32) {
        self.health = (self.health + amount).min(MAX_HEALTH);
    }

    /// Add objective progress, capped at 100. Returns the amount actually gained.
    pub fn add_progress(&mut self, amount: f64) -> f64 {
        let before = self.objective_progress;
        self.objective_progress = (self.objective_progress + amount.max(0.0)).min(MAX_PROGRESS);
        self.objective_progress - before
    }

    pub fn set_vision(&mut self, cells: BTreeSet<Hex>, peers: BTreeSet<ParticipantId>) {
        self.visible_cells = cells;
        self.visible_peers = peers;
    }
}

/// Cosmetic color tag
pub fn color_for(id: ParticipantId) -> &'static str {
    match id {
        1..=6 => COLORS[id as usize - 1],
        _ => "default",
    }
}

/// Cells within `range` of `center`, and which of `peers` stand on them
pub fn compute_vision(
    board: &Board,
    center: Hex,
    range: i32,
    peers: &[(ParticipantId, Hex)],
) -> (BTreeSet<Hex>, BTreeSet<ParticipantId>) {
    let cells: BTreeSet<Hex> = board.within(center, range).collect();
    let seen = peers
        .iter()
        .filter(|(_, pos)| cells.contains(pos))
        .map(|(id, _)| *id)
        .collect();
    (cells, seen)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant() -> Participant {
        Participant::new(1, Hex::new(0, -4), &MatchConfig::default())
    }

    #[test]
    fn test_new_participant() {
        let p = participant();
        assert!(p.is_alive());
        assert_eq!(p.energy, 15);
        assert_eq!(p.max_energy, 15);
        assert_eq!(p.health, 100);
        assert_eq!(p.color, "red");
        assert_eq!(p.name, "Player 1");
    }

    #[test]
    fn test_recent_actions_bounded() {
        let mut p = participant();
        for _ in 0..4 {
            p.record_action(ActionKind::Rest);
        }
        p.record_action(ActionKind::Scout);
        p.record_action(ActionKind::Move);
        assert_eq!(p.recent_actions.len(), RECENT_ACTIONS);
        assert_eq!(p.last_action(), Some(ActionKind::Move));
        assert_eq!(p.recent_actions.front(), Some(&ActionKind::Rest));
    }

    #[test]
    fn test_energy_and_progress_caps() {
        let mut p = participant();
        p.energy = 14;
        assert_eq!(p.gain_energy(5), 1);
        assert_eq!(p.energy, 15);

        p.objective_progress = 95.0;
        let gained = p.add_progress(10.0);
        assert!((gained - 5.0).abs() < 1e-9);
        assert!((p.objective_progress - MAX_PROGRESS).abs() < 1e-9);
    }

    #[test]
    fn test_compute_vision() {
        let board = Board::plain(4);
        let peers = vec![(2, Hex::new(1, 0)), (3, Hex::new(0, 4))];
        let (cells, seen) = compute_vision(&board, Hex::new(0, 0), 2, &peers);
        assert_eq!(cells.len(), 19);
        assert!(seen.contains(&2));
        assert!(!seen.contains(&3));
    }

    #[test]
    fn test_color_for_unknown() {
        assert_eq!(color_for(6), "purple");
        assert_eq!(color_for(9), "default");
    }
}
