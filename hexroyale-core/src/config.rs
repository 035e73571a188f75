//! Match configuration

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Flag accepted when no challenge-specific solution is configured
pub const DEFAULT_SOLUTION: &str = "flag{hexagonal_hunger_games_victory_2025}";

/// Tunable match parameters. Every field has a default so partial JSON
/// files are accepted.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Challenge identifier supplied by the orchestrator
    pub challenge: String,
    pub board_radius: i32,
    pub resource_probability: f64,
    pub participants: usize,

    pub starting_energy: i32,
    pub max_energy: i32,
    pub starting_health: i32,
    pub attack_power: i32,
    pub defense_power: i32,
    pub vision_range: i32,

    pub max_rounds: u32,
    /// Wall-clock budget in seconds
    pub time_limit_secs: u64,
    /// Action records exposed in snapshots and views
    pub history_limit: usize,

    /// Hints unlocked at 25/50/75 progress
    pub hints: Vec<String>,
    pub solution: String,

    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            challenge: "Standard CTF Arena".to_string(),
            board_radius: 4,
            resource_probability: 0.15,
            participants: 6,
            starting_energy: 15,
            max_energy: 15,
            starting_health: 100,
            attack_power: 5,
            defense_power: 3,
            vision_range: 2,
            max_rounds: 20,
            time_limit_secs: 300,
            history_limit: 10,
            hints: vec![
                "The flag format is: flag{...}".to_string(),
                "Look for patterns in the challenge description".to_string(),
                "Try common CTF techniques: base64, rot13, XOR".to_string(),
            ],
            solution: DEFAULT_SOLUTION.to_string(),
            seed: 42,
        }
    }
}

impl MatchConfig {
    /// Load from a JSON file and validate
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read match config: {}", path.display()))?;
        let config: MatchConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse match config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_radius < 1 {
            return Err(ConfigError::InvalidRadius(self.board_radius));
        }
        if !(1..=6).contains(&self.participants) {
            return Err(ConfigError::InvalidParticipantCount(self.participants));
        }
        if !(0.0..=1.0).contains(&self.resource_probability) {
            return Err(ConfigError::InvalidProbability(self.resource_probability));
        }
        if self.max_energy <= 0 {
            return Err(ConfigError::InvalidMaxEnergy(self.max_energy));
        }
        if self.starting_energy < 1 || self.starting_energy > self.max_energy {
            return Err(ConfigError::InvalidStartingEnergy {
                start: self.starting_energy,
                max: self.max_energy,
            });
        }
        if self.vision_range < 1 {
            return Err(ConfigError::InvalidVisionRange(self.vision_range));
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        if self.hints.len() != 3 {
            return Err(ConfigError::InvalidHints(self.hints.len()));
        }
        Ok(())
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_participants(mut self, participants: usize) -> Self {
        self.participants = participants;
        self
    }
}
