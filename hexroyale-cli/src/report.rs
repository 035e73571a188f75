//! Game log file and result printing

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use hexroyale_core::{ActionRecord, MatchSummary, RoundLog, Standing};

// ============================================================================
// GAME LOG
// ============================================================================

#[derive(Clone, Debug, Serialize)]
pub struct GameInfo {
    pub challenge: String,
    pub num_players: usize,
    pub seed: u64,
    pub start_time: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RoundEntry {
    pub round: u32,
    pub timestamp: DateTime<Utc>,
    pub actions: Vec<ActionRecord>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FinalResult {
    pub end_time: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: MatchSummary,
}

/// Timestamped record of one match for external viewers
#[derive(Clone, Debug, Serialize)]
pub struct GameLog {
    pub game_info: GameInfo,
    pub rounds: Vec<RoundEntry>,
    pub final_result: Option<FinalResult>,
}

impl GameLog {
    pub fn new(challenge: &str, num_players: usize, seed: u64) -> Self {
        Self {
            game_info: GameInfo {
                challenge: challenge.to_string(),
                num_players,
                seed,
                start_time: Utc::now(),
            },
            rounds: Vec::new(),
            final_result: None,
        }
    }

    pub fn log_round(&mut self, round: &RoundLog) {
        self.rounds.push(RoundEntry {
            round: round.round,
            timestamp: Utc::now(),
            actions: round.actions.clone(),
        });
    }

    pub fn log_game_end(&mut self, summary: &MatchSummary) {
        self.final_result = Some(FinalResult {
            end_time: Utc::now(),
            summary: summary.clone(),
        });
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write game log: {}", path.display()))?;
        Ok(())
    }
}

// ============================================================================
// PRINTING
// ============================================================================

/// Print a match summary as JSON
pub fn print_json_summary(summary: &MatchSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    println!("{}", json);
    Ok(())
}

/// Print a match summary as text
pub fn print_text_summary(summary: &MatchSummary) {
    println!("\n=== Match Results: {} ===", summary.challenge);
    match summary.winner_standing() {
        Some(winner) => println!("Winner:      {} (#{})", winner.name, winner.participant),
        None => println!("Winner:      none"),
    }
    if let Some(reason) = summary.end_reason {
        println!("End reason:  {}", reason);
    }
    println!("Rounds:      {}", summary.total_rounds);

    println!("\nStandings:");
    for (place, standing) in summary.standings.iter().enumerate() {
        println!("  {}. {}", place + 1, format_standing(standing));
    }
}

fn format_standing(s: &Standing) -> String {
    let mut line = format!(
        "{:<10} {:<16} progress={:>5.1} kills={} territories={} health={} energy={}",
        s.name,
        format!("{:?}", s.status),
        s.objective_progress,
        s.kills,
        s.territories,
        s.final_health,
        s.final_energy
    );
    if let Some(reason) = s.elimination {
        line.push_str(&format!(" ({})", reason));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexroyale_core::{ActionDetail, ActionKind, EndReason, Status};

    fn record(participant: u8) -> ActionRecord {
        ActionRecord {
            round: 1,
            turn: 1,
            participant,
            action: ActionKind::Defend,
            requested: None,
            stall: None,
            success: true,
            energy_before: 15,
            energy_after: 13,
            details: ActionDetail::Defend,
            error: None,
            eliminations: Vec::new(),
        }
    }

    #[test]
    fn test_game_log_rounds() {
        let mut log = GameLog::new("arena", 2, 7);
        log.log_round(&RoundLog {
            round: 1,
            actions: vec![record(1), record(2)],
        });
        log.log_round(&RoundLog {
            round: 2,
            actions: vec![record(1)],
        });
        assert_eq!(log.rounds.len(), 2);
        assert_eq!(log.rounds[0].actions.len(), 2);
        assert_eq!(log.rounds[1].round, 2);
    }

    #[test]
    fn test_game_log_json_shape() {
        let mut log = GameLog::new("arena", 2, 7);
        log.log_game_end(&MatchSummary {
            challenge: "arena".to_string(),
            winner: Some(2),
            end_reason: Some(EndReason::LastSurvivor),
            total_rounds: 4,
            standings: vec![],
        });
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["game_info"]["seed"], 7);
        assert_eq!(json["final_result"]["winner"], 2);
        assert_eq!(json["final_result"]["end_reason"], "last_survivor");
        assert!(json["final_result"]["end_time"].is_string());
    }

    #[test]
    fn test_format_standing() {
        let standing = Standing {
            participant: 3,
            name: "Player 3".to_string(),
            status: Status::Eliminated,
            elimination: Some(hexroyale_core::EliminationReason::EnergyDepleted),
            objective_progress: 12.5,
            kills: 0,
            territories: 2,
            final_health: 80,
            final_energy: 0,
            score: 0.0,
        };
        let line = format_standing(&standing);
        assert!(line.contains("progress= 12.5"));
        assert!(line.ends_with("(energy depleted)"));
    }
}
