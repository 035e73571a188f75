//! Action resolver: per-action effects, stall auto-conversion and idle tax
//!
//! Every resolution runs to completion before returning. Rejections leave
//! state untouched apart from the penalties an invalid MOVE carries.

use std::collections::BTreeMap;

use rand::Rng;

use crate::action::{
    Action, ActionDetail, ActionKind, ActionOutcome, PeerIntel, ScoutIntel, StallReason,
};
use crate::error::{ActionError, EngineError};
use crate::game::Match;
use crate::hex::Hex;
use crate::log::EndReason;
use crate::player::{compute_vision, EliminationReason, ParticipantId, MAX_SHIELD, STRIKE_LIMIT};

// ============================================================================
// BALANCE CONSTANTS
// ============================================================================

const RESOURCE_BONUS: i32 = 3;
const ENERGY_STEAL: i32 = 3;
const KILL_PROGRESS_SHARE: f64 = 0.3;
const REST_ENERGY: i32 = 3;
const REST_HEALING: i32 = 10;
const STEAL_HEALTH_GATE: i32 = 50;
const STEAL_PROGRESS_SHARE: f64 = 0.4;
const STEAL_DAMAGE: i32 = 15;
const HINT_STEAL_CHANCE: f64 = 0.5;
const INVALID_MOVE_PENALTY: i32 = 1;
const IDLE_LIMIT: u32 = 3;
const IDLE_TAX: i32 = 2;
const HINT_THRESHOLDS: [f64; 3] = [25.0, 50.0, 75.0];

impl Match {
    /// Resolve one action for one participant, without judge review.
    ///
    /// Afterwards no participant has negative energy, and anyone left at
    /// exactly zero has been eliminated.
    pub fn resolve_action(
        &mut self,
        id: ParticipantId,
        action: &Action,
    ) -> Result<ActionOutcome, EngineError> {
        let player = self
            .participants
            .get(&id)
            .ok_or(EngineError::UnknownParticipant(id))?;
        if !player.is_alive() {
            return Err(EngineError::NotAlive(id));
        }

        let kind = action.kind();
        let energy = player.energy;
        let cost = kind.cost();
        if cost > 0 && energy < cost {
            return Ok(ActionOutcome::rejected(
                kind,
                energy,
                ActionError::InsufficientEnergy {
                    required: cost,
                    available: energy,
                },
            ));
        }

        let mut outcome = match action {
            Action::Move { target } => self.move_to(id, *target),
            Action::Attack { target } => self.attack(id, *target),
            Action::SolveObjective { solution } => self.solve(id, solution.as_deref()),
            Action::ClaimTerritory => self.claim(id),
            Action::Rest => self.rest(id),
            Action::Scout => self.scout(id),
            Action::Defend => self.defend(id),
            Action::StealProgress { target } => self.steal(id, *target),
        };

        if outcome.executed() {
            if let Some(player) = self.participants.get_mut(&id) {
                player.record_action(outcome.kind);
                player.actions_taken += 1;
            }
            self.apply_idle_tax(id, kind);
        }
        self.settle_energy();

        if let Some(player) = self.participants.get(&id) {
            outcome.energy_after = player.energy;
        }
        Ok(outcome)
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    fn move_to(&mut self, id: ParticipantId, target: Hex) -> ActionOutcome {
        let on_board = self.board.contains(target);
        let Some(player) = self.participants.get_mut(&id) else {
            return ActionOutcome::rejected(ActionKind::Move, 0, ActionError::NoSuchCell(target));
        };
        let mut outcome = ActionOutcome::new(ActionKind::Move, player.energy);

        let error = if !on_board {
            Some(ActionError::NoSuchCell(target))
        } else if !player.position.is_adjacent(target) {
            Some(ActionError::NotAdjacent(target))
        } else {
            None
        };

        if let Some(error) = error {
            player.invalid_move_strikes += 1;
            player.energy = (player.energy - INVALID_MOVE_PENALTY).max(0);
            let strikes = player.invalid_move_strikes;
            let disqualified = strikes >= STRIKE_LIMIT;
            tracing::warn!("Player {} invalid move to {} (strike {})", id, target, strikes);

            outcome.detail = ActionDetail::InvalidMove { strikes, disqualified };
            outcome.error = Some(error);
            if disqualified {
                self.eliminate(id, EliminationReason::IllegalMoves);
            }
            return outcome;
        }

        player.energy -= ActionKind::Move.cost();
        player.position = target;
        player.invalid_move_strikes = 0;

        let resource_bonus = self.board.consume_resource_bonus(target);
        if resource_bonus {
            if let Some(player) = self.participants.get_mut(&id) {
                player.gain_energy(RESOURCE_BONUS);
            }
            tracing::debug!("Player {} collected resource bonus at {}", id, target);
        }
        self.refresh_vision();

        outcome.success = true;
        outcome.detail = ActionDetail::Move {
            position: target,
            resource_bonus,
        };
        outcome
    }

    fn attack(&mut self, id: ParticipantId, target: ParticipantId) -> ActionOutcome {
        let (energy, position, attack_power) = match self.participants.get(&id) {
            Some(p) => (p.energy, p.position, p.attack_power),
            None => return ActionOutcome::rejected(ActionKind::Attack, 0, ActionError::UnknownTarget(id)),
        };
        if let Err(error) = self.check_target(id, position, target) {
            return ActionOutcome::rejected(ActionKind::Attack, energy, error);
        }
        let mut outcome = ActionOutcome::new(ActionKind::Attack, energy);

        if let Some(attacker) = self.participants.get_mut(&id) {
            attacker.energy -= ActionKind::Attack.cost();
        }

        let Some(defender) = self.participants.get_mut(&target) else {
            return outcome;
        };
        if defender.defending {
            tracing::info!("Player {} blocked attack from player {}", target, id);
            outcome.detail = ActionDetail::Attack {
                target,
                blocked: true,
                damage: 0,
                energy_stolen: 0,
                target_health: defender.health,
                eliminated: false,
                progress_stolen: 0.0,
            };
            return outcome;
        }

        let shield_before = defender.shield;
        defender.shield = (shield_before - attack_power).max(0);
        let damage = (attack_power - shield_before - defender.defense_power).max(0);
        defender.health = (defender.health - damage).max(0);

        let energy_stolen = if damage > 0 {
            let stolen = ENERGY_STEAL.min(defender.energy.max(0));
            defender.energy -= stolen;
            stolen
        } else {
            0
        };
        let target_health = defender.health;
        let eliminated = target_health <= 0;
        let target_progress = defender.objective_progress;

        let mut progress_stolen = 0.0;
        if let Some(attacker) = self.participants.get_mut(&id) {
            attacker.gain_energy(energy_stolen);
            if eliminated {
                attacker.kills += 1;
                progress_stolen = attacker.add_progress(target_progress * KILL_PROGRESS_SHARE);
            }
        }
        if eliminated {
            self.eliminate(target, EliminationReason::Combat);
        }

        outcome.success = true;
        outcome.detail = ActionDetail::Attack {
            target,
            blocked: false,
            damage,
            energy_stolen,
            target_health,
            eliminated,
            progress_stolen,
        };
        outcome
    }

    fn solve(&mut self, id: ParticipantId, solution: Option<&str>) -> ActionOutcome {
        let Some(player) = self.participants.get_mut(&id) else {
            return ActionOutcome::rejected(ActionKind::SolveObjective, 0, ActionError::UnknownTarget(id));
        };
        let mut outcome = ActionOutcome::new(ActionKind::SolveObjective, player.energy);
        player.energy -= ActionKind::SolveObjective.cost();
        player.objective_attempts += 1;

        if let Some(attempt) = solution.filter(|s| !s.trim().is_empty()) {
            if self.gateway.check_solution(id, attempt.trim()) {
                self.declare_winner(id, EndReason::ObjectiveSolved);
                let progress = self.participants.get(&id).map_or(0.0, |p| p.objective_progress);
                outcome.success = true;
                outcome.won = true;
                outcome.detail = ActionDetail::Solve {
                    accepted: true,
                    progress,
                    progress_gained: 0.0,
                    hints_unlocked: Vec::new(),
                };
                return outcome;
            }
        }

        let roll: f64 = self.rng.gen_range(5.0..=15.0);
        let hints = self.config.hints.clone();
        let Some(player) = self.participants.get_mut(&id) else {
            return outcome;
        };

        let attempts_bonus = (1.5 * player.objective_attempts as f64).min(10.0);
        let low_energy_penalty = if player.energy < 5 { 5.0 } else { 0.0 };
        let gain = (roll + 2.0 * player.territory_count() as f64 + attempts_bonus - low_energy_penalty)
            .max(0.0);
        let progress_gained = player.add_progress(gain);

        let mut hints_unlocked = Vec::new();
        for (threshold, hint) in HINT_THRESHOLDS.iter().zip(hints) {
            if player.objective_progress >= *threshold && !player.hints.contains(&hint) {
                player.hints.push(hint.clone());
                hints_unlocked.push(hint);
            }
        }
        tracing::debug!(
            "Player {} objective progress +{:.1} -> {:.1}",
            id,
            progress_gained,
            player.objective_progress
        );

        outcome.detail = ActionDetail::Solve {
            accepted: false,
            progress: player.objective_progress,
            progress_gained,
            hints_unlocked,
        };
        outcome
    }

    fn claim(&mut self, id: ParticipantId) -> ActionOutcome {
        let Some(player) = self.participants.get(&id) else {
            return ActionOutcome::rejected(ActionKind::ClaimTerritory, 0, ActionError::UnknownTarget(id));
        };
        let (energy, position) = (player.energy, player.position);
        let owned_here = player.territories.contains(&position);

        match self.board.owner(position) {
            Some(owner) if owner == id => {
                return self
                    .stall_move(id, ActionKind::ClaimTerritory, StallReason::ClaimOwned)
                    .unwrap_or_else(|| {
                        ActionOutcome::rejected(
                            ActionKind::ClaimTerritory,
                            energy,
                            ActionError::AlreadyOwned(position),
                        )
                    });
            }
            Some(owner) => {
                return ActionOutcome::rejected(
                    ActionKind::ClaimTerritory,
                    energy,
                    ActionError::OwnedByOther { cell: position, owner },
                );
            }
            None => {}
        }

        let mut outcome = ActionOutcome::new(ActionKind::ClaimTerritory, energy);
        if let Err(error) = self.board.claim(position, id) {
            outcome.error = Some(error);
            return outcome;
        }
        let Some(player) = self.participants.get_mut(&id) else {
            return outcome;
        };
        player.energy -= ActionKind::ClaimTerritory.cost();
        if !owned_here {
            player.territories.insert(position);
            player.territory_income += 1;
        }
        tracing::debug!("Player {} claimed {}", id, position);

        outcome.success = true;
        outcome.detail = ActionDetail::Claim {
            position,
            territories: player.territory_count(),
            income: player.territory_income,
        };
        outcome
    }

    fn rest(&mut self, id: ParticipantId) -> ActionOutcome {
        let Some(player) = self.participants.get(&id) else {
            return ActionOutcome::rejected(ActionKind::Rest, 0, ActionError::UnknownTarget(id));
        };
        let position = player.position;
        if player.last_action() == Some(ActionKind::Rest) && player.energy >= 4 {
            if let Some(outcome) = self.stall_move(id, ActionKind::Rest, StallReason::RestSpam) {
                return outcome;
            }
        }

        let defense = self.board.get(position).map_or(0, |cell| cell.defense);
        let Some(player) = self.participants.get_mut(&id) else {
            return ActionOutcome::rejected(ActionKind::Rest, 0, ActionError::UnknownTarget(id));
        };
        let mut outcome = ActionOutcome::new(ActionKind::Rest, player.energy);
        let energy_gained = player.gain_energy(REST_ENERGY + player.territory_income);
        player.heal(REST_HEALING);
        if defense > 0 {
            player.shield = (player.shield + 2 * defense).min(MAX_SHIELD);
        }

        outcome.success = true;
        outcome.detail = ActionDetail::Rest {
            energy_gained,
            health: player.health,
            shield: player.shield,
        };
        outcome
    }

    fn scout(&mut self, id: ParticipantId) -> ActionOutcome {
        let Some(player) = self.participants.get(&id) else {
            return ActionOutcome::rejected(ActionKind::Scout, 0, ActionError::UnknownTarget(id));
        };
        let position = player.position;
        let range = player.vision_range * 2;
        let neighbors: Vec<Hex> = self.board.neighbors(position).collect();
        let nothing_new = neighbors.iter().all(|hex| player.explored.contains(hex));
        if nothing_new && player.explored.len() > 3 {
            if let Some(outcome) = self.stall_move(id, ActionKind::Scout, StallReason::ScoutSpam) {
                return outcome;
            }
        }

        let peers: Vec<(ParticipantId, Hex)> = self
            .participants
            .values()
            .filter(|p| p.is_alive() && p.id != id)
            .map(|p| (p.id, p.position))
            .collect();
        let (cells, seen) = compute_vision(&self.board, position, range, &peers);

        let mut intel = ScoutIntel {
            peers: BTreeMap::new(),
            claimed: BTreeMap::new(),
        };
        for peer in seen.iter().filter_map(|pid| self.participants.get(pid)) {
            intel.peers.insert(
                peer.id,
                PeerIntel {
                    position: peer.position,
                    health: peer.health,
                    energy: peer.energy,
                },
            );
        }
        for hex in &cells {
            if let Some(owner) = self.board.owner(*hex) {
                intel.claimed.insert(format!("{},{}", hex.q, hex.r), owner);
            }
        }

        let Some(player) = self.participants.get_mut(&id) else {
            return ActionOutcome::rejected(ActionKind::Scout, 0, ActionError::UnknownTarget(id));
        };
        let mut outcome = ActionOutcome::new(ActionKind::Scout, player.energy);
        player.energy -= ActionKind::Scout.cost();
        player.explored.insert(position);
        player.explored.extend(neighbors);

        outcome.success = true;
        outcome.detail = ActionDetail::Scout {
            players_found: intel.peers.len(),
            intel,
        };
        outcome
    }

    fn defend(&mut self, id: ParticipantId) -> ActionOutcome {
        let Some(player) = self.participants.get_mut(&id) else {
            return ActionOutcome::rejected(ActionKind::Defend, 0, ActionError::UnknownTarget(id));
        };
        let mut outcome = ActionOutcome::new(ActionKind::Defend, player.energy);
        player.energy -= ActionKind::Defend.cost();
        player.defending = true;
        outcome.success = true;
        outcome.detail = ActionDetail::Defend;
        outcome
    }

    fn steal(&mut self, id: ParticipantId, target: ParticipantId) -> ActionOutcome {
        let (energy, position) = match self.participants.get(&id) {
            Some(p) => (p.energy, p.position),
            None => {
                return ActionOutcome::rejected(ActionKind::StealProgress, 0, ActionError::UnknownTarget(id))
            }
        };
        if let Err(error) = self.check_target(id, position, target) {
            return ActionOutcome::rejected(ActionKind::StealProgress, energy, error);
        }
        if self
            .participants
            .get(&target)
            .is_some_and(|t| t.health > STEAL_HEALTH_GATE)
        {
            return ActionOutcome::rejected(
                ActionKind::StealProgress,
                energy,
                ActionError::TargetTooStrong(target),
            );
        }

        let hint_roll = self.rng.gen_bool(HINT_STEAL_CHANCE);
        let mut outcome = ActionOutcome::new(ActionKind::StealProgress, energy);

        let Some(victim) = self.participants.get_mut(&target) else {
            return outcome;
        };
        let taken = victim.objective_progress * STEAL_PROGRESS_SHARE;
        victim.objective_progress = (victim.objective_progress - taken).max(0.0);
        victim.health = (victim.health - STEAL_DAMAGE).max(0);
        let target_health = victim.health;
        let victim_hints = victim.hints.clone();

        let Some(thief) = self.participants.get_mut(&id) else {
            return outcome;
        };
        thief.energy -= ActionKind::StealProgress.cost();
        let progress_stolen = thief.add_progress(taken);

        let mut hints_stolen = Vec::new();
        if hint_roll {
            if let Some(hint) = victim_hints.iter().rev().find(|h| !thief.hints.contains(h)) {
                thief.hints.push(hint.clone());
                hints_stolen.push(hint.clone());
            }
        }
        tracing::info!(
            "Player {} stole {:.1} progress from player {}",
            id,
            progress_stolen,
            target
        );

        outcome.success = true;
        outcome.detail = ActionDetail::Steal {
            target,
            progress_stolen,
            hints_stolen,
            attacker_progress: thief.objective_progress,
            target_health,
        };
        outcome
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    /// Target must exist, be alive and stand next to the actor
    fn check_target(&self, id: ParticipantId, position: Hex, target: ParticipantId) -> Result<(), ActionError> {
        let peer = self
            .participants
            .get(&target)
            .ok_or(ActionError::UnknownTarget(target))?;
        if !peer.is_alive() {
            return Err(ActionError::TargetNotAlive(target));
        }
        if target == id || !position.is_adjacent(peer.position) {
            return Err(ActionError::TargetNotAdjacent(target));
        }
        Ok(())
    }

    /// Replace a stalling action with a step toward the nearest unowned cell.
    /// None when no such cell is reachable or the move is unaffordable.
    fn stall_move(
        &mut self,
        id: ParticipantId,
        requested: ActionKind,
        reason: StallReason,
    ) -> Option<ActionOutcome> {
        let player = self.participants.get(&id)?;
        if player.energy < ActionKind::Move.cost() {
            return None;
        }
        let step = self.board.step_toward_unowned(player.position)?;
        tracing::info!(
            "Auto-converting {} to move for player {} ({:?})",
            requested,
            id,
            reason
        );
        let mut outcome = self.move_to(id, step);
        outcome.converted_from = Some((requested, reason));
        Some(outcome)
    }

    fn apply_idle_tax(&mut self, id: ParticipantId, kind: ActionKind) {
        let Some(player) = self.participants.get_mut(&id) else {
            return;
        };
        if kind.is_objective() {
            player.idle_streak = 0;
            return;
        }
        player.idle_streak += 1;
        if player.idle_streak >= IDLE_LIMIT {
            player.energy -= IDLE_TAX;
            player.idle_streak = 0;
            tracing::info!("Idle tax: player {} loses {} energy", id, IDLE_TAX);
        }
    }

    /// Clamp energy at zero and eliminate the living who hit it
    fn settle_energy(&mut self) {
        let mut drained = Vec::new();
        for player in self.participants.values_mut() {
            player.energy = player.energy.max(0);
            if player.is_alive() && player.energy == 0 {
                drained.push(player.id);
            }
        }
        for id in drained {
            self.eliminate(id, EliminationReason::EnergyDepleted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, CellKind};
    use crate::config::MatchConfig;
    use crate::judge::OpenJudge;
    use crate::player::Status;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const SOLUTION: &str = "flag{test}";

    fn arena(participants: usize, board: Board) -> Match {
        let config = MatchConfig {
            solution: SOLUTION.to_string(),
            ..MatchConfig::default().with_participants(participants)
        };
        let mut game = Match::with_board(config, board, Box::new(OpenJudge::new(SOLUTION))).unwrap();
        game.start();
        game
    }

    fn place(game: &mut Match, id: ParticipantId, hex: Hex) {
        game.participant_mut(id).unwrap().position = hex;
        game.refresh_vision();
    }

    /// Seeded RNG whose first hint-steal roll comes out as `hit`
    fn hint_roll(hit: bool) -> ChaCha8Rng {
        (0u64..)
            .map(ChaCha8Rng::seed_from_u64)
            .find(|rng| rng.clone().gen_bool(HINT_STEAL_CHANCE) == hit)
            .unwrap()
    }

    fn duel() -> Match {
        let mut game = arena(3, Board::plain(4));
        place(&mut game, 1, Hex::new(0, 0));
        place(&mut game, 2, Hex::new(1, 0));
        game
    }

    #[test]
    fn test_attack_scenario() {
        let mut game = duel();
        let outcome = game.resolve_action(1, &Action::Attack { target: 2 }).unwrap();
        assert!(outcome.success);
        match outcome.detail {
            ActionDetail::Attack { damage, energy_stolen, .. } => {
                assert_eq!(damage, 2);
                assert_eq!(energy_stolen, 3);
            }
            other => panic!("unexpected detail {:?}", other),
        }
        let defender = game.participant(2).unwrap();
        assert_eq!(defender.health, 98);
        assert_eq!(defender.energy, 12);
        assert_eq!(game.participant(1).unwrap().energy, 14);
    }

    #[test]
    fn test_attack_shield_absorbs() {
        let mut game = duel();
        game.participant_mut(2).unwrap().shield = 4;
        let outcome = game.resolve_action(1, &Action::Attack { target: 2 }).unwrap();
        let defender = game.participant(2).unwrap();
        assert_eq!(defender.shield, 0);
        assert_eq!(defender.health, 100);
        assert!(matches!(outcome.detail, ActionDetail::Attack { damage: 0, energy_stolen: 0, .. }));
    }

    #[test]
    fn test_blocked_attack_still_costs() {
        let mut game = duel();
        game.participant_mut(2).unwrap().defending = true;
        let outcome = game.resolve_action(1, &Action::Attack { target: 2 }).unwrap();
        assert!(!outcome.success);
        assert!(outcome.executed());
        assert_eq!(game.participant(1).unwrap().energy, 11);
        let defender = game.participant(2).unwrap();
        assert_eq!(defender.health, 100);
        assert!(defender.defending);
    }

    #[test]
    fn test_kill_transfers_progress() {
        let mut game = duel();
        {
            let defender = game.participant_mut(2).unwrap();
            defender.health = 2;
            defender.objective_progress = 50.0;
        }
        let outcome = game.resolve_action(1, &Action::Attack { target: 2 }).unwrap();
        assert!(matches!(outcome.detail, ActionDetail::Attack { eliminated: true, .. }));
        let attacker = game.participant(1).unwrap();
        assert_eq!(attacker.kills, 1);
        assert!((attacker.objective_progress - 15.0).abs() < 1e-9);
        let defender = game.participant(2).unwrap();
        assert_eq!(defender.status, Status::Eliminated);
        assert_eq!(defender.elimination, Some(EliminationReason::Combat));
    }

    #[test]
    fn test_attack_non_adjacent_rejected() {
        let mut game = duel();
        let outcome = game.resolve_action(1, &Action::Attack { target: 3 }).unwrap();
        assert_eq!(outcome.error, Some(ActionError::TargetNotAdjacent(3)));
        assert_eq!(game.participant(1).unwrap().energy, 15);
    }

    #[test]
    fn test_insufficient_energy_no_change() {
        let mut game = duel();
        game.participant_mut(1).unwrap().energy = 1;
        let outcome = game.resolve_action(1, &Action::Move { target: Hex::new(0, 1) }).unwrap();
        assert_eq!(
            outcome.error,
            Some(ActionError::InsufficientEnergy {
                required: 2,
                available: 1
            })
        );
        let player = game.participant(1).unwrap();
        assert_eq!(player.position, Hex::new(0, 0));
        assert_eq!(player.energy, 1);
        assert_eq!(player.invalid_move_strikes, 0);
        assert!(player.recent_actions.is_empty());
    }

    #[test]
    fn test_invalid_moves_strike_out() {
        let mut game = duel();
        for strike in 1..=3 {
            let outcome = game.resolve_action(1, &Action::Move { target: Hex::new(3, 0) }).unwrap();
            assert!(matches!(
                outcome.detail,
                ActionDetail::InvalidMove { strikes, .. } if strikes == strike
            ));
        }
        let player = game.participant(1).unwrap();
        assert_eq!(player.position, Hex::new(0, 0));
        assert_eq!(player.energy, 12);
        assert_eq!(player.elimination, Some(EliminationReason::IllegalMoves));
    }

    #[test]
    fn test_successful_move_resets_strikes() {
        let mut game = duel();
        game.resolve_action(1, &Action::Move { target: Hex::new(9, 9) }).unwrap();
        game.resolve_action(1, &Action::Move { target: Hex::new(0, 1) }).unwrap();
        let player = game.participant(1).unwrap();
        assert_eq!(player.invalid_move_strikes, 0);
        assert_eq!(player.position, Hex::new(0, 1));
        assert_eq!(player.energy, 12);
    }

    #[test]
    fn test_resource_bonus_once() {
        let board = Board::plain(4).with_kind(Hex::new(0, 1), CellKind::Resource);
        let mut game = arena(2, board);
        place(&mut game, 1, Hex::new(0, 0));
        game.participant_mut(1).unwrap().energy = 10;

        let outcome = game.resolve_action(1, &Action::Move { target: Hex::new(0, 1) }).unwrap();
        assert!(matches!(outcome.detail, ActionDetail::Move { resource_bonus: true, .. }));
        assert_eq!(game.participant(1).unwrap().energy, 11);

        game.resolve_action(1, &Action::Move { target: Hex::new(0, 0) }).unwrap();
        let outcome = game.resolve_action(1, &Action::Move { target: Hex::new(0, 1) }).unwrap();
        assert!(matches!(outcome.detail, ActionDetail::Move { resource_bonus: false, .. }));
    }

    #[test]
    fn test_claim_then_owned_claim_converts() {
        let mut game = duel();
        let outcome = game.resolve_action(1, &Action::ClaimTerritory).unwrap();
        assert!(outcome.success);
        assert_eq!(game.board().owner(Hex::new(0, 0)), Some(1));
        assert_eq!(game.participant(1).unwrap().territory_income, 1);

        let outcome = game.resolve_action(1, &Action::ClaimTerritory).unwrap();
        assert_eq!(outcome.kind, ActionKind::Move);
        assert_eq!(
            outcome.converted_from,
            Some((ActionKind::ClaimTerritory, StallReason::ClaimOwned))
        );
        let player = game.participant(1).unwrap();
        assert!(player.position.is_adjacent(Hex::new(0, 0)));
        assert_eq!(game.board().owner(player.position), None);
        assert_eq!(player.last_action(), Some(ActionKind::Move));
    }

    #[test]
    fn test_claim_owned_by_other_rejected() {
        let mut game = duel();
        game.board_mut().claim(Hex::new(0, 0), 2).unwrap();
        let outcome = game.resolve_action(1, &Action::ClaimTerritory).unwrap();
        assert_eq!(
            outcome.error,
            Some(ActionError::OwnedByOther {
                cell: Hex::new(0, 0),
                owner: 2
            })
        );
        assert_eq!(game.participant(1).unwrap().energy, 15);
    }

    #[test]
    fn test_rest_gains_with_income_and_shield() {
        let mut game = duel();
        game.board_mut().fortify(Hex::new(0, 0), 3);
        {
            let player = game.participant_mut(1).unwrap();
            player.energy = 5;
            player.health = 50;
            player.territory_income = 2;
        }
        let outcome = game.resolve_action(1, &Action::Rest).unwrap();
        assert!(matches!(outcome.detail, ActionDetail::Rest { energy_gained: 5, .. }));
        let player = game.participant(1).unwrap();
        assert_eq!(player.energy, 10);
        assert_eq!(player.health, 60);
        assert_eq!(player.shield, 6);
    }

    #[test]
    fn test_repeated_rest_converts_to_move() {
        let mut game = duel();
        game.participant_mut(1).unwrap().energy = 8;
        game.resolve_action(1, &Action::Rest).unwrap();
        let outcome = game.resolve_action(1, &Action::Rest).unwrap();
        assert_eq!(
            outcome.converted_from,
            Some((ActionKind::Rest, StallReason::RestSpam))
        );
        assert_eq!(outcome.kind, ActionKind::Move);
    }

    #[test]
    fn test_scout_explores_then_converts() {
        let mut game = duel();
        let outcome = game.resolve_action(1, &Action::Scout).unwrap();
        match &outcome.detail {
            ActionDetail::Scout { players_found, intel } => {
                // Doubled range reaches the third participant at distance 4
                assert_eq!(*players_found, 2);
                assert!(intel.peers.contains_key(&2));
            }
            other => panic!("unexpected detail {:?}", other),
        }
        assert_eq!(game.participant(1).unwrap().explored.len(), 7);
        // Vision range is unchanged after the scout
        assert_eq!(game.participant(1).unwrap().visible_cells.len(), 19);

        let outcome = game.resolve_action(1, &Action::Scout).unwrap();
        assert_eq!(
            outcome.converted_from,
            Some((ActionKind::Scout, StallReason::ScoutSpam))
        );
    }

    #[test]
    fn test_solve_wrong_solution_gains_progress() {
        let mut game = duel();
        let outcome = game
            .resolve_action(1, &Action::SolveObjective { solution: Some("flag{nope}".into()) })
            .unwrap();
        assert!(!outcome.won);
        assert!(!game.is_over());
        let player = game.participant(1).unwrap();
        assert_eq!(player.energy, 10);
        assert_eq!(player.objective_attempts, 1);
        // roll >= 5, attempts bonus 1.5
        assert!(player.objective_progress >= 6.5);
        assert!(player.objective_progress <= 16.5);
    }

    #[test]
    fn test_solve_unlocks_hints_in_order() {
        let mut game = duel();
        game.participant_mut(1).unwrap().objective_progress = 74.0;
        game.resolve_action(1, &Action::SolveObjective { solution: None }).unwrap();
        let player = game.participant(1).unwrap();
        assert_eq!(player.hints, game.config().hints);

        game.resolve_action(1, &Action::SolveObjective { solution: None }).unwrap();
        assert_eq!(game.participant(1).unwrap().hints.len(), 3);
    }

    #[test]
    fn test_correct_solution_wins() {
        let mut game = duel();
        let outcome = game
            .resolve_action(1, &Action::SolveObjective { solution: Some(SOLUTION.into()) })
            .unwrap();
        assert!(outcome.won);
        assert_eq!(game.winner(), Some(1));
        assert_eq!(game.end_reason(), Some(EndReason::ObjectiveSolved));
        assert_eq!(game.participant(2).unwrap().elimination, Some(EliminationReason::Outplayed));
    }

    #[test]
    fn test_steal_requires_weak_target() {
        let mut game = duel();
        let outcome = game.resolve_action(1, &Action::StealProgress { target: 2 }).unwrap();
        assert_eq!(outcome.error, Some(ActionError::TargetTooStrong(2)));
        assert_eq!(game.participant(1).unwrap().energy, 15);
    }

    #[test]
    fn test_steal_transfers_progress() {
        let mut game = duel();
        {
            let victim = game.participant_mut(2).unwrap();
            victim.health = 40;
            victim.objective_progress = 50.0;
            victim.hints = vec!["a".into(), "b".into()];
        }
        game.rng = hint_roll(true);
        let outcome = game.resolve_action(1, &Action::StealProgress { target: 2 }).unwrap();
        assert!(outcome.success);
        let thief = game.participant(1).unwrap();
        assert_eq!(thief.energy, 9);
        assert!((thief.objective_progress - 20.0).abs() < 1e-9);
        assert_eq!(thief.hints, vec!["b".to_string()]);
        let victim = game.participant(2).unwrap();
        assert_eq!(victim.health, 25);
        assert!((victim.objective_progress - 30.0).abs() < 1e-9);
        assert_eq!(victim.hints.len(), 2);
    }

    #[test]
    fn test_steal_skips_hints_already_held() {
        let mut game = duel();
        {
            let victim = game.participant_mut(2).unwrap();
            victim.health = 40;
            victim.hints = vec!["a".into(), "b".into()];
        }
        game.participant_mut(1).unwrap().hints = vec!["b".into()];
        game.rng = hint_roll(true);

        let outcome = game.resolve_action(1, &Action::StealProgress { target: 2 }).unwrap();
        match &outcome.detail {
            ActionDetail::Steal { hints_stolen, .. } => assert_eq!(hints_stolen, &vec!["a".to_string()]),
            other => panic!("unexpected detail {:?}", other),
        }
        assert_eq!(game.participant(1).unwrap().hints, vec!["b".to_string(), "a".to_string()]);

        // Nothing left to copy: no duplicates appear
        game.participant_mut(2).unwrap().health = 40;
        game.rng = hint_roll(true);
        let outcome = game.resolve_action(1, &Action::StealProgress { target: 2 }).unwrap();
        assert!(outcome.success);
        assert_eq!(game.participant(1).unwrap().hints, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(game.participant(2).unwrap().hints.len(), 2);
    }

    #[test]
    fn test_steal_missed_hint_roll() {
        let mut game = duel();
        {
            let victim = game.participant_mut(2).unwrap();
            victim.health = 40;
            victim.hints = vec!["a".into()];
        }
        game.rng = hint_roll(false);
        let outcome = game.resolve_action(1, &Action::StealProgress { target: 2 }).unwrap();
        assert!(outcome.success);
        assert!(game.participant(1).unwrap().hints.is_empty());
    }

    #[test]
    fn test_scout_at_board_edge_converts_when_explored() {
        // (0, -4) is a corner with three on-board neighbors
        let corner = Hex::new(0, -4);
        let neighbors = [Hex::new(1, -4), Hex::new(-1, -3), Hex::new(0, -3)];

        let mut game = arena(2, Board::plain(4));
        game.participant_mut(1).unwrap().explored = neighbors.into_iter().collect();
        let outcome = game.resolve_action(1, &Action::Scout).unwrap();
        assert_eq!(outcome.kind, ActionKind::Scout);
        assert_eq!(outcome.converted_from, None);

        let mut game = arena(2, Board::plain(4));
        game.participant_mut(1).unwrap().explored = neighbors.into_iter().chain([corner]).collect();
        let outcome = game.resolve_action(1, &Action::Scout).unwrap();
        assert_eq!(outcome.kind, ActionKind::Move);
        assert_eq!(
            outcome.converted_from,
            Some((ActionKind::Scout, StallReason::ScoutSpam))
        );
        let player = game.participant(1).unwrap();
        assert!(player.position.is_adjacent(corner));
        assert_eq!(player.energy, 13);
    }

    #[test]
    fn test_move_far_off_board_is_a_strike() {
        let mut game = duel();
        let target = Hex::new(i32::MIN, 0);
        let outcome = game.resolve_action(1, &Action::Move { target }).unwrap();
        assert_eq!(outcome.error, Some(ActionError::NoSuchCell(target)));
        let player = game.participant(1).unwrap();
        assert_eq!(player.invalid_move_strikes, 1);
        assert_eq!(player.energy, 14);
        assert_eq!(player.position, Hex::new(0, 0));
    }

    #[test]
    fn test_defend_sets_flag() {
        let mut game = duel();
        game.resolve_action(1, &Action::Defend).unwrap();
        let player = game.participant(1).unwrap();
        assert!(player.defending);
        assert_eq!(player.energy, 13);
    }

    #[test]
    fn test_idle_tax_after_three() {
        let mut game = duel();
        game.resolve_action(1, &Action::Defend).unwrap();
        game.resolve_action(1, &Action::Defend).unwrap();
        assert_eq!(game.participant(1).unwrap().energy, 11);
        game.resolve_action(1, &Action::Defend).unwrap();
        let player = game.participant(1).unwrap();
        assert_eq!(player.energy, 7);
        assert_eq!(player.idle_streak, 0);

        game.resolve_action(1, &Action::Defend).unwrap();
        game.resolve_action(1, &Action::Attack { target: 2 }).unwrap();
        assert_eq!(game.participant(1).unwrap().idle_streak, 0);
    }

    #[test]
    fn test_zero_energy_eliminates() {
        let mut game = duel();
        game.participant_mut(1).unwrap().energy = 2;
        let outcome = game.resolve_action(1, &Action::Defend).unwrap();
        assert_eq!(outcome.energy_after, 0);
        let player = game.participant(1).unwrap();
        assert_eq!(player.status, Status::Eliminated);
        assert_eq!(player.elimination, Some(EliminationReason::EnergyDepleted));
    }

    #[test]
    fn test_idle_tax_never_leaves_negative_energy() {
        let mut game = duel();
        {
            let player = game.participant_mut(1).unwrap();
            player.energy = 3;
            player.idle_streak = 2;
        }
        game.resolve_action(1, &Action::Defend).unwrap();
        let player = game.participant(1).unwrap();
        assert_eq!(player.energy, 0);
        assert_eq!(player.elimination, Some(EliminationReason::EnergyDepleted));
    }
}
