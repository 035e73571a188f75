//! Error types

use crate::action::ActionKind;
use crate::hex::Hex;
use crate::player::ParticipantId;

/// Controller misuse: the requested turn cannot be taken at all
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("match has not started")]
    NotStarted,

    #[error("match is over")]
    MatchOver,

    #[error("unknown participant {0}")]
    UnknownParticipant(ParticipantId),

    #[error("participant {0} is not active")]
    NotAlive(ParticipantId),
}

/// Structured rejection of a requested action.
///
/// A rejected action leaves match state untouched except for penalties
/// attached to the action itself (invalid-move strikes).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("insufficient energy: required {required}, available {available}")]
    InsufficientEnergy { required: i32, available: i32 },

    #[error("target {0} not adjacent")]
    NotAdjacent(Hex),

    #[error("no cell at {0}")]
    NoSuchCell(Hex),

    #[error("unknown target participant {0}")]
    UnknownTarget(ParticipantId),

    #[error("target participant {0} is not alive")]
    TargetNotAlive(ParticipantId),

    #[error("participant {0} is not adjacent")]
    TargetNotAdjacent(ParticipantId),

    #[error("participant {0} is too strong to steal from")]
    TargetTooStrong(ParticipantId),

    #[error("cell {cell} is owned by participant {owner}")]
    OwnedByOther { cell: Hex, owner: ParticipantId },

    #[error("cell {0} is already owned; move to a new cell to claim")]
    AlreadyOwned(Hex),

    #[error("illegal {action}: {reasoning}")]
    Illegal { action: ActionKind, reasoning: String },
}

/// Failure of the external judge capability
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JudgeError {
    #[error("judge unavailable: {0}")]
    Unavailable(String),

    #[error("malformed verdict: {0}")]
    Malformed(String),
}

/// Failure of a participant's decision source
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    #[error("decision source unavailable: {0}")]
    Unavailable(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("{0} requires a target")]
    MissingTarget(ActionKind),

    #[error("scripted actions exhausted")]
    Exhausted,
}

/// Invalid match configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("board radius must be at least 1, got {0}")]
    InvalidRadius(i32),

    #[error("participant count must be between 1 and 6, got {0}")]
    InvalidParticipantCount(usize),

    #[error("resource probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),

    #[error("max energy must be positive, got {0}")]
    InvalidMaxEnergy(i32),

    #[error("starting energy {start} outside 1..={max}")]
    InvalidStartingEnergy { start: i32, max: i32 },

    #[error("vision range must be at least 1, got {0}")]
    InvalidVisionRange(i32),

    #[error("round cap must be at least 1")]
    ZeroRounds,

    #[error("expected exactly 3 objective hints, got {0}")]
    InvalidHints(usize),
}
