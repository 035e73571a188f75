//! Play command - run a single match with heuristic agents
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_config(), play_match(), report_results()
//! - Level 3: build_roster()

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use hexroyale_core::{HeuristicAgent, Match, MatchConfig, MatchSummary, Roster};

use crate::report::{print_json_summary, print_text_summary, GameLog};
use crate::{base_seed, JudgeKind};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    /// Match config JSON file (defaults apply to missing fields)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Challenge identifier
    #[arg(long)]
    pub challenge: Option<String>,

    /// Number of participants (1-6)
    #[arg(long)]
    pub participants: Option<usize>,

    /// Round cap
    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Judge ruling on actions
    #[arg(long, value_enum, default_value_t = JudgeKind::Rule)]
    pub judge: JudgeKind,

    /// Write a timestamped game log to this file
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let seed = base_seed(seed);
    let config = load_config(&args, seed)?;

    tracing::info!(
        "Starting match: {} ({} participants, seed={})",
        config.challenge,
        config.participants,
        seed
    );

    let (summary, log) = play_match(config, args.judge)?;

    if let Some(path) = &args.log {
        log.save(path)?;
        tracing::info!("Game log written to {}", path.display());
    }
    report_results(&summary, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Load the config file if given, then apply command-line overrides
pub fn load_config(args: &PlayArgs, seed: u64) -> Result<MatchConfig> {
    let mut config = match &args.config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    if let Some(challenge) = &args.challenge {
        config.challenge = challenge.clone();
    }
    if let Some(participants) = args.participants {
        config.participants = participants;
    }
    if let Some(max_rounds) = args.max_rounds {
        config.max_rounds = max_rounds;
    }
    config.seed = seed;
    config.validate().context("Invalid match configuration")?;
    Ok(config)
}

/// Play one match, logging every round as it completes
fn play_match(config: MatchConfig, judge: JudgeKind) -> Result<(MatchSummary, GameLog)> {
    let mut log = GameLog::new(&config.challenge, config.participants, config.seed);
    let mut roster = build_roster(&config);
    let judge = judge.build(&config);
    let mut game = Match::new(config, judge).context("Failed to create match")?;

    let summary = game.play_observed(&mut roster, |game| {
        if let Some(round) = game.rounds().last() {
            log.log_round(round);
        }
    });
    log.log_game_end(&summary);
    Ok((summary, log))
}

fn report_results(summary: &MatchSummary, json: bool) -> Result<()> {
    if json {
        print_json_summary(summary)
    } else {
        print_text_summary(summary);
        Ok(())
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// One heuristic agent per participant, each seeded from the match seed
pub fn build_roster(config: &MatchConfig) -> Roster {
    let mut roster = Roster::new();
    for id in 1..=config.participants as u8 {
        let agent = HeuristicAgent::new(config.seed.wrapping_add(id as u64));
        roster.insert(id, Box::new(agent));
    }
    roster
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> PlayArgs {
        PlayArgs {
            config: None,
            challenge: Some("Crypto 101".to_string()),
            participants: Some(4),
            max_rounds: Some(8),
            judge: JudgeKind::Rule,
            log: None,
            json: false,
        }
    }

    #[test]
    fn test_load_config_overrides() {
        let config = load_config(&args(), 99).unwrap();
        assert_eq!(config.challenge, "Crypto 101");
        assert_eq!(config.participants, 4);
        assert_eq!(config.max_rounds, 8);
        assert_eq!(config.seed, 99);
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let mut args = args();
        args.participants = Some(9);
        assert!(load_config(&args, 1).is_err());
    }

    #[test]
    fn test_build_roster() {
        let config = MatchConfig::default().with_participants(3);
        let roster = build_roster(&config);
        assert_eq!(roster.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_play_match_logs_every_round() {
        let config = load_config(&args(), 5).unwrap();
        let (summary, log) = play_match(config, JudgeKind::Rule).unwrap();
        assert_eq!(log.rounds.len() as u32, summary.total_rounds);
        assert!(log.final_result.is_some());
        assert_eq!(summary.standings.len(), 4);
    }
}
