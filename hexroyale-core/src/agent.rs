//! Decision sources: what a participant does each turn
//!
//! The engine only sees the [`DecisionSource`] trait. Implementations here
//! cover a rule-based player, a scripted replay and a bridge to an external
//! text-producing source with a line-oriented reply format:
//!
//! ```text
//! ACTION: MOVE
//! TARGET: [3, -2]
//! REASONING: heading for open ground
//! ```

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;

use crate::action::{Action, ActionKind};
use crate::error::DecisionError;
use crate::hex::{step_toward, Hex};
use crate::player::ParticipantId;
use crate::view::ParticipantView;

pub trait DecisionSource {
    fn decide(&mut self, view: &ParticipantView) -> Result<Action, DecisionError>;
}

/// Safe substitute when a decision source fails: scout while healthy and
/// able to pay for it, otherwise rest
pub fn fallback_action(view: &ParticipantView) -> Action {
    let me = &view.me;
    if me.health >= 25 && me.energy > ActionKind::Scout.cost() {
        Action::Scout
    } else {
        Action::Rest
    }
}

// ============================================================================
// HEURISTIC AGENT
// ============================================================================

/// Energy kept in hand after paying for an action, enough to absorb an idle
/// tax without dropping to zero
const ENERGY_RESERVE: i32 = 3;

const CRITICAL_HEALTH: i32 = 25;
const PUSH_PROGRESS: f64 = 50.0;
const CONFIDENT_PROGRESS: f64 = 80.0;
const STEAL_HEALTH: i32 = 50;

/// Rule-based player. Seeded, so a match with only heuristic agents is
/// reproducible.
pub struct HeuristicAgent {
    rng: ChaCha8Rng,
    guesses: Vec<String>,
}

impl HeuristicAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            guesses: vec![
                "flag{hexagonal_hunger_games_victory_2025}".to_string(),
                "flag{ctf_battle_royale_winner}".to_string(),
                "flag{ai_agent_supreme}".to_string(),
            ],
        }
    }

    /// Replace the candidate solutions tried at high progress
    pub fn with_guesses(mut self, guesses: Vec<String>) -> Self {
        self.guesses = guesses;
        self
    }

    fn educated_guess(&mut self, progress: f64) -> String {
        if progress >= CONFIDENT_PROGRESS {
            if let Some(guess) = self.guesses.choose(&mut self.rng) {
                return guess.clone();
            }
        }
        if progress >= PUSH_PROGRESS {
            format!("flag{{strategic_victory_{}}}", self.rng.gen_range(100..1000))
        } else {
            format!("flag{{attempt_{}}}", self.rng.gen_range(1000..10000))
        }
    }
}

impl DecisionSource for HeuristicAgent {
    fn decide(&mut self, view: &ParticipantView) -> Result<Action, DecisionError> {
        let me = &view.me;
        if me.health < CRITICAL_HEALTH {
            return Ok(Action::Rest);
        }

        let owners: FxHashMap<Hex, Option<ParticipantId>> =
            view.cells.iter().map(|c| (c.hex, c.owner)).collect();
        let mut candidates = Vec::with_capacity(4);

        // Objective: push at high progress, otherwise try every third round
        if me.objective_progress >= PUSH_PROGRESS || view.round % 3 == 0 {
            let solution = self.educated_guess(me.objective_progress);
            candidates.push(Action::SolveObjective {
                solution: Some(solution),
            });
        }

        if let Some(prey) = view
            .peers
            .iter()
            .find(|p| p.health <= STEAL_HEALTH && p.position.is_adjacent(me.position))
        {
            candidates.push(Action::StealProgress { target: prey.id });
        }

        match owners.get(&me.position).copied().flatten() {
            None => candidates.push(Action::ClaimTerritory),
            Some(_) => {
                let step = step_toward(
                    me.position,
                    |hex| owners.contains_key(&hex),
                    |hex| owners.get(&hex).is_some_and(|owner| owner.is_none()),
                );
                if let Some(target) = step {
                    candidates.push(Action::Move { target });
                }
            }
        }
        candidates.push(Action::Scout);

        let energy = me.energy;
        let action = candidates
            .into_iter()
            .find(|a| a.cost() <= 0 || energy >= a.cost() + ENERGY_RESERVE)
            .unwrap_or(Action::Rest);
        Ok(action)
    }
}

// ============================================================================
// SCRIPTED AGENT
// ============================================================================

/// Replays a fixed sequence of actions
#[derive(Clone, Debug, Default)]
pub struct ScriptedAgent {
    queue: VecDeque<Action>,
}

impl ScriptedAgent {
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            queue: actions.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl DecisionSource for ScriptedAgent {
    fn decide(&mut self, _view: &ParticipantView) -> Result<Action, DecisionError> {
        self.queue.pop_front().ok_or(DecisionError::Exhausted)
    }
}

// ============================================================================
// TEXT AGENT
// ============================================================================

/// Bridge to an external source that answers a JSON view with text
pub struct TextAgent<F> {
    responder: F,
}

impl<F> TextAgent<F>
where
    F: FnMut(&str) -> anyhow::Result<String>,
{
    pub fn new(responder: F) -> Self {
        Self { responder }
    }
}

impl<F> DecisionSource for TextAgent<F>
where
    F: FnMut(&str) -> anyhow::Result<String>,
{
    fn decide(&mut self, view: &ParticipantView) -> Result<Action, DecisionError> {
        let prompt = serde_json::to_string(view).map_err(|e| DecisionError::Malformed(e.to_string()))?;
        let reply = (self.responder)(&prompt).map_err(|e| DecisionError::Unavailable(format!("{:#}", e)))?;
        parse_response(&reply, view)
    }
}

/// Parse an `ACTION:` / `TARGET:` reply
pub fn parse_response(text: &str, view: &ParticipantView) -> Result<Action, DecisionError> {
    let mut action = None;
    let mut target = None;
    for line in text.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("ACTION:") {
            action = Some(rest.trim().to_uppercase());
        } else if let Some(rest) = line.strip_prefix("TARGET:") {
            target = Some(rest.trim());
        }
    }

    let action = action
        .filter(|a| !a.is_empty())
        .ok_or_else(|| DecisionError::Malformed("missing ACTION line".to_string()))?;
    let target = target.filter(|t| !t.is_empty());

    if action.contains("MOVE") {
        match integers(target.unwrap_or_default()).as_slice() {
            [q, r, ..] if q.abs() > view.board_radius || r.abs() > view.board_radius => Err(
                DecisionError::Malformed(format!("move target ({}, {}) is off the board", q, r)),
            ),
            [q, r, ..] => Ok(Action::Move {
                target: Hex::new(*q, *r),
            }),
            _ => Err(DecisionError::MissingTarget(ActionKind::Move)),
        }
    } else if action.contains("ATTACK") {
        player_target(target, view)
            .map(|target| Action::Attack { target })
            .ok_or(DecisionError::MissingTarget(ActionKind::Attack))
    } else if action.contains("SOLVE") || action.contains("CTF") || action.contains("OBJECTIVE") {
        let solution = target
            .filter(|t| {
                let lower = t.to_lowercase();
                lower.contains("flag{") || lower.contains("ctf{")
            })
            .map(str::to_string);
        Ok(Action::SolveObjective { solution })
    } else if action.contains("CLAIM") {
        Ok(Action::ClaimTerritory)
    } else if action.contains("REST") {
        Ok(Action::Rest)
    } else if action.contains("SCOUT") {
        Ok(Action::Scout)
    } else if action.contains("DEFEND") {
        Ok(Action::Defend)
    } else if action.contains("STEAL") {
        player_target(target, view)
            .map(|target| Action::StealProgress { target })
            .ok_or(DecisionError::MissingTarget(ActionKind::StealProgress))
    } else {
        Err(DecisionError::Malformed(format!("unknown action '{}'", action)))
    }
}

/// Signed integers appearing in `text`, in order. Values outside
/// `-i32::MAX..=i32::MAX` are skipped so callers may take `abs()`.
fn integers(text: &str) -> Vec<i32> {
    text.split(|c: char| !(c.is_ascii_digit() || c == '-'))
        .filter_map(|token| token.parse::<i32>().ok())
        .filter(|n| *n != i32::MIN)
        .collect()
}

/// A named live participant, else the first visible peer
fn player_target(target: Option<&str>, view: &ParticipantView) -> Option<ParticipantId> {
    let named = target
        .map(integers)
        .unwrap_or_default()
        .into_iter()
        .find_map(|n| ParticipantId::try_from(n).ok())
        .filter(|id| view.alive.contains(id));
    named.or_else(|| view.peers.first().map(|p| p.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::config::MatchConfig;
    use crate::game::Match;
    use crate::judge::OpenJudge;

    fn game() -> Match {
        let config = MatchConfig::default().with_participants(3);
        let mut game = Match::with_board(config, Board::plain(4), Box::new(OpenJudge::new("flag{x}"))).unwrap();
        game.start();
        game.begin_round();
        game
    }

    fn view(game: &Match) -> ParticipantView {
        game.view_for(1).unwrap()
    }

    #[test]
    fn test_parse_move() {
        let game = game();
        let action = parse_response("ACTION: MOVE\nTARGET: [3, -2]\nREASONING: go", &view(&game)).unwrap();
        assert_eq!(action, Action::Move { target: Hex::new(3, -2) });

        let err = parse_response("ACTION: MOVE\nREASONING: somewhere", &view(&game)).unwrap_err();
        assert_eq!(err, DecisionError::MissingTarget(ActionKind::Move));
    }

    #[test]
    fn test_parse_move_beyond_board_radius() {
        let game = game();
        for reply in [
            "ACTION: MOVE\nTARGET: [-2147483648, 0]",
            "ACTION: MOVE\nTARGET: [2147483647, -2147483647]",
            "ACTION: MOVE\nTARGET: [5, 0]",
        ] {
            let err = parse_response(reply, &view(&game)).unwrap_err();
            assert!(matches!(err, DecisionError::Malformed(_) | DecisionError::MissingTarget(_)));
        }
        // Inside the radius but off the hexagon still parses; the resolver rules on it
        let action = parse_response("ACTION: MOVE\nTARGET: [4, 4]", &view(&game)).unwrap();
        assert_eq!(action, Action::Move { target: Hex::new(4, 4) });
    }

    #[test]
    fn test_parse_solve() {
        let game = game();
        let action = parse_response("ACTION: SOLVE_CTF\nTARGET: flag{abc}", &view(&game)).unwrap();
        assert_eq!(action, Action::SolveObjective { solution: Some("flag{abc}".to_string()) });

        let action = parse_response("ACTION: solve_objective\nTARGET: no idea", &view(&game)).unwrap();
        assert_eq!(action, Action::SolveObjective { solution: None });
    }

    #[test]
    fn test_parse_player_targets() {
        let mut game = game();
        game.participant_mut(2).unwrap().position = Hex::new(0, -3);
        game.refresh_vision();
        let view = view(&game);

        let action = parse_response("ACTION: ATTACK_PLAYER\nTARGET: Player 3", &view).unwrap();
        assert_eq!(action, Action::Attack { target: 3 });

        // Unknown id falls back to a visible peer
        let action = parse_response("ACTION: STEAL_PROGRESS\nTARGET: 9", &view).unwrap();
        assert_eq!(action, Action::StealProgress { target: 2 });
    }

    #[test]
    fn test_parse_malformed() {
        let game = game();
        let view = view(&game);
        assert!(matches!(parse_response("I will rest now", &view), Err(DecisionError::Malformed(_))));
        assert!(matches!(parse_response("ACTION: DANCE", &view), Err(DecisionError::Malformed(_))));
        assert_eq!(parse_response("  ACTION: rest  ", &view), Ok(Action::Rest));
    }

    #[test]
    fn test_fallback_action() {
        let mut game = game();
        assert_eq!(fallback_action(&view(&game)), Action::Scout);
        game.participant_mut(1).unwrap().health = 20;
        assert_eq!(fallback_action(&view(&game)), Action::Rest);
        game.participant_mut(1).unwrap().health = 100;
        game.participant_mut(1).unwrap().energy = 2;
        assert_eq!(fallback_action(&view(&game)), Action::Rest);
    }

    #[test]
    fn test_heuristic_claims_then_moves_on() {
        let mut game = game();
        let mut agent = HeuristicAgent::new(1);
        let action = agent.decide(&view(&game)).unwrap();
        assert_eq!(action, Action::ClaimTerritory);

        game.execute_turn(1, action).unwrap();
        let action = agent.decide(&view(&game)).unwrap();
        match action {
            Action::Move { target } => {
                assert!(target.is_adjacent(Hex::new(0, -4)));
                assert_eq!(game.board().owner(target), None);
            }
            other => panic!("expected move, got {:?}", other),
        }
    }

    #[test]
    fn test_heuristic_rests_when_hurt() {
        let mut game = game();
        game.participant_mut(1).unwrap().health = 10;
        let mut agent = HeuristicAgent::new(1);
        assert_eq!(agent.decide(&view(&game)).unwrap(), Action::Rest);
    }

    #[test]
    fn test_heuristic_pushes_objective() {
        let mut game = game();
        game.participant_mut(1).unwrap().objective_progress = 85.0;
        let mut agent = HeuristicAgent::new(1).with_guesses(vec!["flag{x}".to_string()]);
        assert_eq!(
            agent.decide(&view(&game)).unwrap(),
            Action::SolveObjective { solution: Some("flag{x}".to_string()) }
        );

        // Too poor to solve safely: claim is cheaper
        game.participant_mut(1).unwrap().energy = 6;
        assert_eq!(agent.decide(&view(&game)).unwrap(), Action::ClaimTerritory);
    }

    #[test]
    fn test_scripted_agent_exhausts() {
        let game = game();
        let mut agent = ScriptedAgent::new([Action::Defend]);
        assert_eq!(agent.remaining(), 1);
        assert_eq!(agent.decide(&view(&game)), Ok(Action::Defend));
        assert_eq!(agent.decide(&view(&game)), Err(DecisionError::Exhausted));
    }

    #[test]
    fn test_text_agent() {
        let game = game();
        let mut agent = TextAgent::new(|prompt: &str| {
            assert!(prompt.contains("\"assigned_id\":1"));
            Ok("ACTION: DEFEND\nREASONING: brace".to_string())
        });
        assert_eq!(agent.decide(&view(&game)), Ok(Action::Defend));

        let mut broken = TextAgent::new(|_: &str| Err(anyhow::anyhow!("timed out")));
        assert!(matches!(broken.decide(&view(&game)), Err(DecisionError::Unavailable(_))));
    }
}
