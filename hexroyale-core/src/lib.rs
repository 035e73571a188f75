//! HEXROYALE Core - Battle-royale match engine
//!
//! This crate provides the match engine for HEXROYALE:
//! - Hex geometry (axial coordinates, BFS stepping)
//! - Board with typed, claimable cells
//! - Participant state and vision
//! - Action resolution with stall auto-conversion and idle tax
//! - Match controller, timeout ranking and standings
//! - Judge gateway and pluggable decision sources

pub mod hex;
pub mod board;
pub mod player;
pub mod action;
pub mod resolve;
pub mod game;
pub mod ranking;
pub mod judge;
pub mod agent;
pub mod view;
pub mod log;
pub mod config;
pub mod error;

// Re-exports for convenient access
pub use hex::{Hex, DIRECTIONS};
pub use board::{Board, Cell, CellKind};
pub use player::{EliminationReason, Participant, ParticipantId, Status};
pub use action::{Action, ActionDetail, ActionKind, ActionOutcome, StallReason};
pub use game::{Match, Phase, Roster};
pub use ranking::{timeout_score, Standing};
pub use judge::{Judge, JudgeGateway, OpenJudge, RuleJudge, Verdict};
pub use agent::{fallback_action, parse_response, DecisionSource, HeuristicAgent, ScriptedAgent, TextAgent};
pub use view::{MatchSnapshot, ParticipantView};
pub use log::{ActionRecord, EndReason, MatchSummary, RoundLog};
pub use config::MatchConfig;
pub use error::{ActionError, ConfigError, DecisionError, EngineError, JudgeError};
