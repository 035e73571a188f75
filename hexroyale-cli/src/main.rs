//! HEXROYALE CLI - Command-line interface
//!
//! Commands:
//! - play: Run a single match and print or save the result
//! - batch: Run many independent matches in parallel and aggregate them

mod batch_cmd;
mod play_cmd;
mod report;

use clap::{Parser, Subcommand, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use hexroyale_core::{Judge, MatchConfig, OpenJudge, RuleJudge};

#[derive(Parser)]
#[command(name = "hexroyale")]
#[command(about = "HEXROYALE hex-grid battle royale")]
struct Cli {
    /// Base RNG seed (random if omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single match with heuristic agents
    Play(play_cmd::PlayArgs),
    /// Run a batch of independent matches
    Batch(batch_cmd::BatchArgs),
}

/// Which judge rules on actions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum JudgeKind {
    /// Deterministic rule checks
    #[default]
    Rule,
    /// Approve everything; the resolver's own checks apply
    Open,
}

impl JudgeKind {
    pub fn build(self, config: &MatchConfig) -> Box<dyn Judge> {
        match self {
            JudgeKind::Rule => Box::new(RuleJudge::new(config.solution.clone())),
            JudgeKind::Open => Box::new(OpenJudge::new(config.solution.clone())),
        }
    }
}

/// Resolve the seed: fixed if given, random otherwise
pub fn base_seed(seed: Option<u64>) -> u64 {
    match seed {
        Some(s) => s,
        None => ChaCha8Rng::from_entropy().gen(),
    }
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON on stdout stays clean
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => play_cmd::run(args, cli.seed),
        Commands::Batch(args) => batch_cmd::run(args, cli.seed),
    }
}
