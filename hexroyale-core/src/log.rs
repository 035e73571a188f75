//! Action log records and the final match summary

use serde::{Deserialize, Serialize};

use crate::action::{ActionDetail, ActionKind, ActionOutcome, StallReason};
use crate::error::ActionError;
use crate::player::{EliminationReason, ParticipantId};
use crate::ranking::Standing;

/// How a match ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    ObjectiveSolved,
    LastSurvivor,
    NoSurvivors,
    RoundLimit,
    TimeLimit,
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            EndReason::ObjectiveSolved => "objective solved",
            EndReason::LastSurvivor => "last survivor",
            EndReason::NoSurvivors => "no survivors",
            EndReason::RoundLimit => "round limit",
            EndReason::TimeLimit => "time limit",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elimination {
    pub participant: ParticipantId,
    pub reason: EliminationReason,
}

/// One entry of the exported action log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub round: u32,
    pub turn: u32,
    pub participant: ParticipantId,
    /// Kind that executed, after any stall conversion
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested: Option<ActionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stall: Option<StallReason>,
    pub success: bool,
    pub energy_before: i32,
    pub energy_after: i32,
    pub details: ActionDetail,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Eliminations caused by this turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eliminations: Vec<Elimination>,
}

impl ActionRecord {
    pub fn from_outcome(
        round: u32,
        turn: u32,
        participant: ParticipantId,
        outcome: &ActionOutcome,
        eliminations: Vec<Elimination>,
    ) -> Self {
        let (requested, stall) = match outcome.converted_from {
            Some((kind, reason)) => (Some(kind), Some(reason)),
            None => (None, None),
        };
        Self {
            round,
            turn,
            participant,
            action: outcome.kind,
            requested,
            stall,
            success: outcome.success,
            energy_before: outcome.energy_before,
            energy_after: outcome.energy_after,
            details: outcome.detail.clone(),
            error: outcome.error.as_ref().map(|e| e.to_string()),
            eliminations,
        }
    }

    /// A turn refused before resolution
    pub fn rejected(
        round: u32,
        turn: u32,
        participant: ParticipantId,
        action: ActionKind,
        energy: i32,
        error: &ActionError,
    ) -> Self {
        Self {
            round,
            turn,
            participant,
            action,
            requested: None,
            stall: None,
            success: false,
            energy_before: energy,
            energy_after: energy,
            details: ActionDetail::None,
            error: Some(error.to_string()),
            eliminations: Vec::new(),
        }
    }

    /// A turn taken after the time budget ran out
    pub fn timed_out(
        round: u32,
        turn: u32,
        participant: ParticipantId,
        action: ActionKind,
        energy: i32,
        eliminations: Vec<Elimination>,
    ) -> Self {
        Self {
            round,
            turn,
            participant,
            action,
            requested: None,
            stall: None,
            success: false,
            energy_before: energy,
            energy_after: energy,
            details: ActionDetail::None,
            error: Some("timeout".to_string()),
            eliminations,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundLog {
    pub round: u32,
    pub actions: Vec<ActionRecord>,
}

impl RoundLog {
    pub fn new(round: u32) -> Self {
        Self {
            round,
            actions: Vec::new(),
        }
    }
}

/// Final result payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub challenge: String,
    pub winner: Option<ParticipantId>,
    pub end_reason: Option<EndReason>,
    pub total_rounds: u32,
    pub standings: Vec<Standing>,
}

impl MatchSummary {
    pub fn winner_standing(&self) -> Option<&Standing> {
        let winner = self.winner?;
        self.standings.iter().find(|s| s.participant == winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::Hex;

    #[test]
    fn test_record_from_converted_outcome() {
        let mut outcome = ActionOutcome::new(ActionKind::Move, 10);
        outcome.converted_from = Some((ActionKind::ClaimTerritory, StallReason::ClaimOwned));
        outcome.success = true;
        outcome.energy_after = 8;
        outcome.detail = ActionDetail::Move {
            position: Hex::new(1, 0),
            resource_bonus: false,
        };

        let record = ActionRecord::from_outcome(2, 7, 3, &outcome, Vec::new());
        assert_eq!(record.action, ActionKind::Move);
        assert_eq!(record.requested, Some(ActionKind::ClaimTerritory));
        assert_eq!(record.energy_after, 8);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["action"], "move");
        assert_eq!(json["details"]["type"], "move");
        assert_eq!(json["stall"], "claim_owned");
        assert!(json.get("error").is_none());
        assert!(json.get("eliminations").is_none());
    }

    #[test]
    fn test_rejected_record() {
        let error = ActionError::InsufficientEnergy {
            required: 5,
            available: 2,
        };
        let record = ActionRecord::rejected(1, 1, 2, ActionKind::SolveObjective, 2, &error);
        assert!(!record.success);
        assert_eq!(record.energy_before, record.energy_after);
        assert_eq!(
            record.error.as_deref(),
            Some("insufficient energy: required 5, available 2")
        );
    }
}
