//! Batch command - many independent matches in parallel
//!
//! Each match owns its board, participants, judge and agents; seeds are
//! derived from the base seed and the game index.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;

use hexroyale_core::{EndReason, Match, MatchConfig, ParticipantId};

use crate::play_cmd::build_roster;
use crate::{base_seed, JudgeKind};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct BatchArgs {
    /// Number of matches to run
    #[arg(long, default_value = "100")]
    pub games: u64,

    /// Match config JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of participants (1-6)
    #[arg(long)]
    pub participants: Option<usize>,

    /// Judge ruling on actions
    #[arg(long, value_enum, default_value_t = JudgeKind::Rule)]
    pub judge: JudgeKind,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Outcome of one match in the batch
#[derive(Clone, Debug, Serialize)]
pub struct BatchRecord {
    pub game: u64,
    pub seed: u64,
    pub winner: Option<ParticipantId>,
    pub end_reason: Option<EndReason>,
    pub rounds: u32,
}

/// Aggregated batch results
#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchResults {
    pub total_games: usize,
    pub wins: BTreeMap<ParticipantId, usize>,
    pub no_winner: usize,
    pub end_reasons: BTreeMap<String, usize>,
    pub avg_rounds: f32,
    pub elapsed_secs: f64,
    /// Per-game records, included in JSON output
    pub games: Vec<BatchRecord>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(args: BatchArgs, seed: Option<u64>) -> Result<()> {
    let seed = base_seed(seed);
    let mut config = match &args.config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    if let Some(participants) = args.participants {
        config.participants = participants;
    }
    config.validate().context("Invalid match configuration")?;

    tracing::info!(
        "Starting batch: {} games, {} participants, base seed {}",
        args.games,
        config.participants,
        seed
    );

    let pb = args.progress.then(|| progress_bar(args.games));
    let start = Instant::now();
    let games = play_batch(&config, args.judge, args.games, seed, pb.as_ref())?;
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let mut results = compute_batch_statistics(games);
    results.elapsed_secs = start.elapsed().as_secs_f64();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_text_results(&results);
    }
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Play every match of the batch in parallel
pub fn play_batch(
    config: &MatchConfig,
    judge: JudgeKind,
    games: u64,
    base_seed: u64,
    pb: Option<&ProgressBar>,
) -> Result<Vec<BatchRecord>> {
    (0..games)
        .into_par_iter()
        .map(|game| {
            let record = play_one(config, judge, game, base_seed.wrapping_add(game));
            if let Some(pb) = pb {
                pb.inc(1);
            }
            record
        })
        .collect()
}

pub fn compute_batch_statistics(games: Vec<BatchRecord>) -> BatchResults {
    let mut results = BatchResults {
        total_games: games.len(),
        ..Default::default()
    };

    for game in &games {
        match game.winner {
            Some(id) => *results.wins.entry(id).or_insert(0) += 1,
            None => results.no_winner += 1,
        }
        let reason = game
            .end_reason
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unresolved".to_string());
        *results.end_reasons.entry(reason).or_insert(0) += 1;
    }

    let total_rounds: u32 = games.iter().map(|g| g.rounds).sum();
    results.avg_rounds = if games.is_empty() {
        0.0
    } else {
        total_rounds as f32 / games.len() as f32
    };
    results.games = games;
    results
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn play_one(config: &MatchConfig, judge: JudgeKind, game: u64, seed: u64) -> Result<BatchRecord> {
    let config = config.clone().with_seed(seed);
    let mut roster = build_roster(&config);
    let judge = judge.build(&config);
    let mut state = Match::new(config, judge).context("Failed to create match")?;
    let summary = state.play(&mut roster);

    tracing::debug!(
        "Game {}: winner={:?} ({:?}, {} rounds)",
        game,
        summary.winner,
        summary.end_reason,
        summary.total_rounds
    );

    Ok(BatchRecord {
        game,
        seed,
        winner: summary.winner,
        end_reason: summary.end_reason,
        rounds: summary.total_rounds,
    })
}

fn progress_bar(games: u64) -> ProgressBar {
    let pb = ProgressBar::new(games);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

fn print_text_results(results: &BatchResults) {
    let total = results.total_games;
    let pct = |n: usize| {
        if total > 0 {
            n as f32 / total as f32 * 100.0
        } else {
            0.0
        }
    };

    println!("\n=== Batch Results ===");
    println!("Total games: {}", total);
    println!("Avg rounds:  {:.1}", results.avg_rounds);
    println!("Elapsed:     {:.2}s", results.elapsed_secs);

    println!("\nWins:");
    for (id, wins) in &results.wins {
        println!("  Player {}: {} ({:.1}%)", id, wins, pct(*wins));
    }
    println!("  No winner: {} ({:.1}%)", results.no_winner, pct(results.no_winner));

    println!("\nEnd reasons:");
    for (reason, count) in &results.end_reasons {
        println!("  {:<18} {}", reason, count);
    }
}
