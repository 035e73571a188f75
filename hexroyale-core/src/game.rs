//! Match controller: round/turn sequencing, eliminations and win detection

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::agent::{fallback_action, DecisionSource};
use crate::board::{spawn_points, Board};
use crate::config::MatchConfig;
use crate::error::{ActionError, ConfigError, EngineError};
use crate::judge::{Judge, JudgeGateway, ReviewRequest};
use crate::log::{ActionRecord, Elimination, EndReason, MatchSummary, RoundLog};
use crate::player::{compute_vision, EliminationReason, Participant, ParticipantId, Status};
use crate::ranking::{rank, standings, timeout_winner};

/// Decision sources keyed by participant; participants without one skip
/// their turns
pub type Roster = BTreeMap<ParticipantId, Box<dyn DecisionSource>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    Running,
    Ended,
}

// ============================================================================
// MATCH STATE
// ============================================================================

/// One isolated match. Nothing is shared between matches.
pub struct Match {
    pub(crate) config: MatchConfig,
    pub(crate) board: Board,
    pub(crate) participants: BTreeMap<ParticipantId, Participant>,
    pub(crate) gateway: JudgeGateway,
    pub(crate) rng: ChaCha8Rng,

    round: u32,
    turn: u32,
    phase: Phase,
    pub(crate) started_at: Option<Instant>,
    winner: Option<ParticipantId>,
    end_reason: Option<EndReason>,

    pending_eliminations: Vec<Elimination>,
    history: Vec<ActionRecord>,
    rounds: Vec<RoundLog>,
}

impl Match {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Create a match with a generated board and participants on the spawn
    /// vertices
    pub fn new(config: MatchConfig, judge: Box<dyn Judge>) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let board = Board::generate(config.board_radius, config.resource_probability, &mut rng);
        Ok(Self::assemble(config, board, judge, rng))
    }

    /// Create a match on a prepared board
    pub fn with_board(
        config: MatchConfig,
        board: Board,
        judge: Box<dyn Judge>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self::assemble(config, board, judge, rng))
    }

    fn assemble(config: MatchConfig, board: Board, judge: Box<dyn Judge>, rng: ChaCha8Rng) -> Self {
        let spawns = spawn_points(board.radius());
        let participants = spawns
            .iter()
            .take(config.participants)
            .enumerate()
            .map(|(i, &spawn)| {
                let id = i as ParticipantId + 1;
                (id, Participant::new(id, spawn, &config))
            })
            .collect();

        let mut game = Self {
            config,
            board,
            participants,
            gateway: JudgeGateway::new(judge),
            rng,
            round: 0,
            turn: 0,
            phase: Phase::NotStarted,
            started_at: None,
            winner: None,
            end_reason: None,
            pending_eliminations: Vec::new(),
            history: Vec::new(),
            rounds: Vec::new(),
        };
        game.refresh_vision();
        game
    }

    /// Enter the running phase and start the clock
    pub fn start(&mut self) {
        if self.phase != Phase::NotStarted {
            return;
        }
        self.phase = Phase::Running;
        self.started_at = Some(Instant::now());
        tracing::info!(
            "Match started: {} ({} participants, radius {})",
            self.config.challenge,
            self.participants.len(),
            self.board.radius()
        );
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable board access for scenario setup
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn participants(&self) -> impl Iterator<Item = &Participant> + '_ {
        self.participants.values()
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    /// Mutable participant access for scenario setup. Call
    /// [`Match::refresh_vision`] after moving anyone.
    pub fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.get_mut(&id)
    }

    pub fn gateway(&self) -> &JudgeGateway {
        &self.gateway
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::Ended
    }

    pub fn winner(&self) -> Option<ParticipantId> {
        self.winner
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn history(&self) -> &[ActionRecord] {
        &self.history
    }

    /// The last `limit` action records
    pub fn recent_history(&self, limit: usize) -> &[ActionRecord] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }

    pub fn rounds(&self) -> &[RoundLog] {
        &self.rounds
    }

    pub fn alive_ids(&self) -> Vec<ParticipantId> {
        self.participants
            .values()
            .filter(|p| p.is_alive())
            .map(|p| p.id)
            .collect()
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn remaining(&self) -> Duration {
        self.config.time_limit().saturating_sub(self.elapsed())
    }

    fn time_exceeded(&self) -> bool {
        self.started_at.is_some() && self.elapsed() > self.config.time_limit()
    }

    // ========================================================================
    // TURNS
    // ========================================================================

    /// Open a new round: bump the counter and drop last round's defenses
    pub fn begin_round(&mut self) -> u32 {
        self.round += 1;
        for p in self.participants.values_mut() {
            p.defending = false;
        }
        self.rounds.push(RoundLog::new(self.round));
        self.round
    }

    /// Validate and resolve one action for one participant.
    ///
    /// Judge rejections and resolver rejections are returned as records with
    /// an error, never as `Err`. `Err` means the turn could not be taken.
    pub fn execute_turn(
        &mut self,
        id: ParticipantId,
        action: Action,
    ) -> Result<ActionRecord, EngineError> {
        match self.phase {
            Phase::NotStarted => return Err(EngineError::NotStarted),
            Phase::Ended => return Err(EngineError::MatchOver),
            Phase::Running => {}
        }
        let player = self
            .participants
            .get(&id)
            .ok_or(EngineError::UnknownParticipant(id))?;
        if !player.is_alive() {
            return Err(EngineError::NotAlive(id));
        }
        let energy = player.energy;

        if self.time_exceeded() {
            tracing::warn!("Player {} acted after the time limit", id);
            self.eliminate(id, EliminationReason::Timeout);
            self.turn += 1;
            let record = ActionRecord::timed_out(
                self.round,
                self.turn,
                id,
                action.kind(),
                energy,
                self.take_eliminations(),
            );
            self.push_record(&record);
            return Ok(record);
        }

        let validation = {
            let request = ReviewRequest {
                round: self.round,
                participant: player,
                action: &action,
                board: &self.board,
                participants: &self.participants,
            };
            self.gateway.validate(&request)
        };
        self.turn += 1;

        if !validation.legal {
            tracing::info!(
                "Illegal {} from player {} blocked: {}",
                action.kind(),
                id,
                validation.reasoning
            );
            let error = ActionError::Illegal {
                action: action.kind(),
                reasoning: validation.reasoning,
            };
            let record = ActionRecord::rejected(self.round, self.turn, id, action.kind(), energy, &error);
            self.push_record(&record);
            return Ok(record);
        }

        let outcome = self.resolve_action(id, &action)?;
        self.check_eliminations();

        let record = ActionRecord::from_outcome(
            self.round,
            self.turn,
            id,
            &outcome,
            self.take_eliminations(),
        );
        self.push_record(&record);
        Ok(record)
    }

    /// Play one round: every participant alive at round start, in id order,
    /// asks its decision source for an action
    pub fn play_round(&mut self, agents: &mut Roster) {
        self.begin_round();
        let order = self.alive_ids();

        for id in order {
            if self.is_over() {
                break;
            }
            if !self.participants.get(&id).is_some_and(|p| p.is_alive()) {
                continue;
            }
            let Some(agent) = agents.get_mut(&id) else {
                continue;
            };
            let Some(view) = self.view_for(id) else {
                continue;
            };

            let action = match agent.decide(&view) {
                Ok(action) => action,
                Err(e) => {
                    let action = fallback_action(&view);
                    tracing::warn!("Player {} decision failed ({}), using {}", id, e, action.kind());
                    action
                }
            };

            if let Err(e) = self.execute_turn(id, action) {
                tracing::debug!("Turn for player {} skipped: {}", id, e);
            }
        }
    }

    /// Run the match to completion
    pub fn play(&mut self, agents: &mut Roster) -> MatchSummary {
        self.play_observed(agents, |_| {})
    }

    /// Run the match to completion, calling `observe` after every round
    pub fn play_observed<F>(&mut self, agents: &mut Roster, mut observe: F) -> MatchSummary
    where
        F: FnMut(&Match),
    {
        self.start();
        while !self.is_over() {
            if self.round >= self.config.max_rounds {
                self.resolve_by_ranking(EndReason::RoundLimit);
                break;
            }
            if self.time_exceeded() {
                self.resolve_by_ranking(EndReason::TimeLimit);
                break;
            }
            self.play_round(agents);
            observe(self);
        }
        self.summary()
    }

    // ========================================================================
    // ELIMINATION & VICTORY
    // ========================================================================

    /// Eliminate anyone whose health or energy is exhausted
    pub fn check_eliminations(&mut self) {
        let doomed: Vec<(ParticipantId, EliminationReason)> = self
            .participants
            .values()
            .filter(|p| p.is_alive())
            .filter_map(|p| {
                if p.health <= 0 {
                    Some((p.id, EliminationReason::HealthDepleted))
                } else if p.energy < 0 {
                    Some((p.id, EliminationReason::EnergyDepleted))
                } else {
                    None
                }
            })
            .collect();

        for (id, reason) in doomed {
            self.eliminate(id, reason);
        }
    }

    /// Remove a participant from play and release their territory
    pub(crate) fn eliminate(&mut self, id: ParticipantId, reason: EliminationReason) {
        let Some(player) = self.participants.get_mut(&id) else {
            return;
        };
        if !player.is_alive() {
            return;
        }
        player.status = Status::Eliminated;
        player.elimination = Some(reason);
        player.defending = false;
        for &hex in &player.territories {
            self.board.release(hex);
        }
        tracing::info!("Player {} eliminated - {}", id, reason);
        self.pending_eliminations.push(Elimination {
            participant: id,
            reason,
        });

        self.check_survivors();
    }

    fn check_survivors(&mut self) {
        if self.is_over() {
            return;
        }
        let alive = self.alive_ids();
        match alive.as_slice() {
            [] => {
                tracing::info!("Match over - no survivors");
                self.phase = Phase::Ended;
                self.end_reason = Some(EndReason::NoSurvivors);
            }
            [last] => self.declare_winner(*last, EndReason::LastSurvivor),
            _ => {}
        }
    }

    /// Crown a winner. Other survivors lose: by tie-break when the match ran
    /// out of budget, outright otherwise.
    pub(crate) fn declare_winner(&mut self, id: ParticipantId, reason: EndReason) {
        let by_ranking = matches!(reason, EndReason::RoundLimit | EndReason::TimeLimit);
        self.winner = Some(id);
        self.end_reason = Some(reason);
        self.phase = Phase::Ended;

        for player in self.participants.values_mut() {
            if player.id == id {
                player.status = Status::Winner;
            } else if player.is_alive() {
                if by_ranking {
                    player.status = Status::LostByTiebreak;
                } else {
                    player.status = Status::Eliminated;
                    player.elimination = Some(EliminationReason::Outplayed);
                    player.defending = false;
                    for &hex in &player.territories {
                        self.board.release(hex);
                    }
                    self.pending_eliminations.push(Elimination {
                        participant: player.id,
                        reason: EliminationReason::Outplayed,
                    });
                }
            }
        }
        tracing::info!("Player {} wins ({:?})", id, reason);
    }

    /// Settle an exhausted budget with the composite-score ranking
    pub fn resolve_by_ranking(&mut self, reason: EndReason) {
        if self.is_over() {
            return;
        }
        for entry in rank(self.participants.values()) {
            tracing::info!("Timeout ranking: player {} score={:.1}", entry.participant, entry.score);
        }
        match timeout_winner(self.participants.values()) {
            Some(id) => self.declare_winner(id, reason),
            None => {
                self.phase = Phase::Ended;
                self.end_reason = Some(EndReason::NoSurvivors);
            }
        }
    }

    // ========================================================================
    // BOOKKEEPING
    // ========================================================================

    /// Recompute vision for every living participant
    pub fn refresh_vision(&mut self) {
        let positions: Vec<(ParticipantId, crate::hex::Hex)> = self
            .participants
            .values()
            .filter(|p| p.is_alive())
            .map(|p| (p.id, p.position))
            .collect();

        for player in self.participants.values_mut().filter(|p| p.is_alive()) {
            let peers: Vec<_> = positions.iter().copied().filter(|(id, _)| *id != player.id).collect();
            let (cells, seen) = compute_vision(&self.board, player.position, player.vision_range, &peers);
            player.set_vision(cells, seen);
        }
    }

    fn take_eliminations(&mut self) -> Vec<Elimination> {
        std::mem::take(&mut self.pending_eliminations)
    }

    fn push_record(&mut self, record: &ActionRecord) {
        if self.rounds.last().map(|r| r.round) != Some(self.round) {
            self.rounds.push(RoundLog::new(self.round));
        }
        if let Some(round) = self.rounds.last_mut() {
            round.actions.push(record.clone());
        }
        self.history.push(record.clone());
    }

    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            challenge: self.config.challenge.clone(),
            winner: self.winner,
            end_reason: self.end_reason,
            total_rounds: self.round,
            standings: standings(self.participants.values()),
        }
    }
}
