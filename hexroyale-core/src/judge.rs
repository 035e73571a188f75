//! Judge gateway: pre-execution legality review and objective validation
//!
//! The judge itself is an external, possibly fallible capability. The gateway
//! wraps it with two fixed policies:
//! - legality review fails open: an erroring judge approves the action
//! - solution checks fail closed: an erroring judge rejects the solution

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionKind};
use crate::board::Board;
use crate::error::JudgeError;
use crate::player::{Participant, ParticipantId};

// ============================================================================
// JUDGE CONTRACT
// ============================================================================

/// Legality ruling for a proposed action
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub legal: bool,
    pub reasoning: String,
}

impl Verdict {
    pub fn legal(reasoning: impl Into<String>) -> Self {
        Self {
            legal: true,
            reasoning: reasoning.into(),
        }
    }

    pub fn illegal(reasoning: impl Into<String>) -> Self {
        Self {
            legal: false,
            reasoning: reasoning.into(),
        }
    }
}

/// Everything a judge may look at when reviewing an action
pub struct ReviewRequest<'a> {
    pub round: u32,
    pub participant: &'a Participant,
    pub action: &'a Action,
    pub board: &'a Board,
    pub participants: &'a BTreeMap<ParticipantId, Participant>,
}

pub trait Judge {
    /// Rule on an action before it executes
    fn review(&mut self, request: &ReviewRequest<'_>) -> Result<Verdict, JudgeError>;

    /// Decide whether an objective solution is correct
    fn check_solution(&mut self, participant: ParticipantId, attempt: &str)
        -> Result<bool, JudgeError>;
}

// ============================================================================
// GATEWAY
// ============================================================================

/// A recorded judge ruling
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub round: u32,
    pub participant: ParticipantId,
    pub action: ActionKind,
    pub legal: bool,
    pub reasoning: String,
    /// Ruling came from the fail-open fallback, not the judge
    pub fallback: bool,
}

pub struct JudgeGateway {
    judge: Box<dyn Judge>,
    history: Vec<Validation>,
    solution_checks: u32,
}

impl JudgeGateway {
    pub fn new(judge: Box<dyn Judge>) -> Self {
        Self {
            judge,
            history: Vec::new(),
            solution_checks: 0,
        }
    }

    /// Review an action. Judge failures approve the action.
    pub fn validate(&mut self, request: &ReviewRequest<'_>) -> Validation {
        let participant = request.participant.id;
        let action = request.action.kind();

        let validation = match self.judge.review(request) {
            Ok(verdict) => {
                tracing::debug!(
                    "Judge: player {} {} - {} ({})",
                    participant,
                    action,
                    if verdict.legal { "legal" } else { "illegal" },
                    verdict.reasoning
                );
                Validation {
                    round: request.round,
                    participant,
                    action,
                    legal: verdict.legal,
                    reasoning: verdict.reasoning,
                    fallback: false,
                }
            }
            Err(e) => {
                tracing::warn!("Judge error, allowing {} for player {}: {}", action, participant, e);
                Validation {
                    round: request.round,
                    participant,
                    action,
                    legal: true,
                    reasoning: format!("Judge validation failed, allowing action. Error: {}", e),
                    fallback: true,
                }
            }
        };

        self.history.push(validation.clone());
        validation
    }

    /// Check a solution. Judge failures reject it.
    pub fn check_solution(&mut self, participant: ParticipantId, attempt: &str) -> bool {
        self.solution_checks += 1;
        match self.judge.check_solution(participant, attempt) {
            Ok(accepted) => {
                tracing::info!(
                    "Judge: solution from player {} {}",
                    participant,
                    if accepted { "accepted" } else { "rejected" }
                );
                accepted
            }
            Err(e) => {
                tracing::warn!("Judge error checking solution from player {}: {}", participant, e);
                false
            }
        }
    }

    pub fn history(&self) -> &[Validation] {
        &self.history
    }

    pub fn solution_checks(&self) -> u32 {
        self.solution_checks
    }

    pub fn round_validations(&self, round: u32) -> impl Iterator<Item = &Validation> + '_ {
        self.history.iter().filter(move |v| v.round == round)
    }

    pub fn clear_round(&mut self, round: u32) {
        self.history.retain(|v| v.round != round);
    }
}

// ============================================================================
// JUDGES
// ============================================================================

/// Deterministic rule-based judge
#[derive(Clone, Debug)]
pub struct RuleJudge {
    solution: String,
}

impl RuleJudge {
    pub fn new(solution: impl Into<String>) -> Self {
        Self {
            solution: solution.into(),
        }
    }

    fn rule(request: &ReviewRequest<'_>) -> Verdict {
        let player = request.participant;
        if !player.is_alive() {
            return Verdict::illegal("Participant is not alive");
        }

        let cost = request.action.cost();
        if cost > 0 && player.energy < cost {
            return Verdict::illegal(format!(
                "Insufficient energy: has {}, needs {}",
                player.energy, cost
            ));
        }

        match request.action {
            Action::Move { target } => {
                if !request.board.contains(*target) {
                    return Verdict::illegal(format!("Target {} is not on the board", target));
                }
                if !player.position.is_adjacent(*target) {
                    return Verdict::illegal(format!("Target {} is not adjacent", target));
                }
            }
            Action::Attack { target } | Action::StealProgress { target } => {
                let Some(peer) = request.participants.get(target) else {
                    return Verdict::illegal(format!("Participant {} does not exist", target));
                };
                if !peer.is_alive() {
                    return Verdict::illegal(format!("Participant {} is not alive", target));
                }
                if !player.position.is_adjacent(peer.position) {
                    return Verdict::illegal(format!("Participant {} is not adjacent", target));
                }
            }
            Action::ClaimTerritory => {
                if let Some(owner) = request.board.owner(player.position) {
                    if owner != player.id {
                        return Verdict::illegal(format!("Cell is owned by participant {}", owner));
                    }
                }
            }
            Action::SolveObjective { .. } | Action::Rest | Action::Scout | Action::Defend => {}
        }

        Verdict::legal("Action satisfies the rules")
    }
}

impl Judge for RuleJudge {
    fn review(&mut self, request: &ReviewRequest<'_>) -> Result<Verdict, JudgeError> {
        Ok(Self::rule(request))
    }

    fn check_solution(&mut self, _participant: ParticipantId, attempt: &str) -> Result<bool, JudgeError> {
        Ok(attempt == self.solution)
    }
}

/// Advisory judge: approves everything, leaving the resolver's own checks
/// and penalties as the only gate
#[derive(Clone, Debug)]
pub struct OpenJudge {
    solution: String,
}

impl OpenJudge {
    pub fn new(solution: impl Into<String>) -> Self {
        Self {
            solution: solution.into(),
        }
    }
}

impl Judge for OpenJudge {
    fn review(&mut self, _request: &ReviewRequest<'_>) -> Result<Verdict, JudgeError> {
        Ok(Verdict::legal("Advisory judge approves all actions"))
    }

    fn check_solution(&mut self, _participant: ParticipantId, attempt: &str) -> Result<bool, JudgeError> {
        Ok(attempt == self.solution)
    }
}
