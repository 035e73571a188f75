//! Action kinds, payloads and resolution outcomes

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::hex::Hex;
use crate::player::ParticipantId;

// ============================================================================
// ACTION KINDS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Move,
    Attack,
    SolveObjective,
    ClaimTerritory,
    Rest,
    Scout,
    Defend,
    StealProgress,
}

impl ActionKind {
    pub const ALL: [ActionKind; 8] = [
        ActionKind::Move,
        ActionKind::Attack,
        ActionKind::SolveObjective,
        ActionKind::ClaimTerritory,
        ActionKind::Rest,
        ActionKind::Scout,
        ActionKind::Defend,
        ActionKind::StealProgress,
    ];

    /// Energy cost; negative means a net gain
    pub const fn cost(self) -> i32 {
        match self {
            ActionKind::Move => 2,
            ActionKind::Attack => 4,
            ActionKind::SolveObjective => 5,
            ActionKind::ClaimTerritory => 3,
            ActionKind::Rest => -3,
            ActionKind::Scout => 2,
            ActionKind::Defend => 2,
            ActionKind::StealProgress => 6,
        }
    }

    /// Objective actions reset the idle streak instead of extending it
    pub const fn is_objective(self) -> bool {
        matches!(
            self,
            ActionKind::SolveObjective | ActionKind::Attack | ActionKind::StealProgress
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            ActionKind::Move => "move",
            ActionKind::Attack => "attack",
            ActionKind::SolveObjective => "solve_objective",
            ActionKind::ClaimTerritory => "claim_territory",
            ActionKind::Rest => "rest",
            ActionKind::Scout => "scout",
            ActionKind::Defend => "defend",
            ActionKind::StealProgress => "steal_progress",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A requested action with its kind-specific payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Move { target: Hex },
    Attack { target: ParticipantId },
    SolveObjective { solution: Option<String> },
    ClaimTerritory,
    Rest,
    Scout,
    Defend,
    StealProgress { target: ParticipantId },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Move { .. } => ActionKind::Move,
            Action::Attack { .. } => ActionKind::Attack,
            Action::SolveObjective { .. } => ActionKind::SolveObjective,
            Action::ClaimTerritory => ActionKind::ClaimTerritory,
            Action::Rest => ActionKind::Rest,
            Action::Scout => ActionKind::Scout,
            Action::Defend => ActionKind::Defend,
            Action::StealProgress { .. } => ActionKind::StealProgress,
        }
    }

    pub fn cost(&self) -> i32 {
        self.kind().cost()
    }

    /// Target participant, for actions aimed at a peer
    pub fn target_participant(&self) -> Option<ParticipantId> {
        match self {
            Action::Attack { target } | Action::StealProgress { target } => Some(*target),
            _ => None,
        }
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// Why the resolver substituted a MOVE for the requested action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StallReason {
    ClaimOwned,
    RestSpam,
    ScoutSpam,
}

/// Peer stats gathered by a scout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerIntel {
    pub position: Hex,
    pub health: i32,
    pub energy: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoutIntel {
    pub peers: BTreeMap<ParticipantId, PeerIntel>,
    pub claimed: BTreeMap<String, ParticipantId>,
}

/// Action-kind-specific projection of what happened
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionDetail {
    None,
    Move {
        position: Hex,
        resource_bonus: bool,
    },
    InvalidMove {
        strikes: u32,
        disqualified: bool,
    },
    Attack {
        target: ParticipantId,
        blocked: bool,
        damage: i32,
        energy_stolen: i32,
        target_health: i32,
        eliminated: bool,
        progress_stolen: f64,
    },
    Solve {
        accepted: bool,
        progress: f64,
        progress_gained: f64,
        hints_unlocked: Vec<String>,
    },
    Claim {
        position: Hex,
        territories: usize,
        income: i32,
    },
    Rest {
        energy_gained: i32,
        health: i32,
        shield: i32,
    },
    Scout {
        players_found: usize,
        intel: ScoutIntel,
    },
    Defend,
    Steal {
        target: ParticipantId,
        progress_stolen: f64,
        hints_stolen: Vec<String>,
        attacker_progress: f64,
        target_health: i32,
    },
}

/// Structured result of resolving one action
#[derive(Clone, Debug, PartialEq)]
pub struct ActionOutcome {
    /// Kind actually executed, after any stall conversion
    pub kind: ActionKind,
    /// Requested kind when a stall conversion happened
    pub converted_from: Option<(ActionKind, StallReason)>,
    pub success: bool,
    pub energy_before: i32,
    pub energy_after: i32,
    pub detail: ActionDetail,
    pub error: Option<ActionError>,
    /// True when the action ended the match in the acting participant's favor
    pub won: bool,
}

impl ActionOutcome {
    pub(crate) fn new(kind: ActionKind, energy_before: i32) -> Self {
        Self {
            kind,
            converted_from: None,
            success: false,
            energy_before,
            energy_after: energy_before,
            detail: ActionDetail::None,
            error: None,
            won: false,
        }
    }

    pub(crate) fn rejected(kind: ActionKind, energy: i32, error: ActionError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(kind, energy)
        }
    }

    /// Whether the action took effect (including blocked attacks and
    /// wrong-solution attempts). Rejections did not execute.
    pub fn executed(&self) -> bool {
        self.error.is_none()
    }

    pub fn was_converted(&self) -> bool {
        self.converted_from.is_some()
    }
}
