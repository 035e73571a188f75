//! Timeout ranking and final standings

use serde::{Deserialize, Serialize};

use crate::player::{EliminationReason, Participant, ParticipantId, Status};

/// Composite score used to settle a match that ran out of rounds or time
pub fn timeout_score(p: &Participant) -> f64 {
    3.0 * p.objective_progress
        + 2.0 * p.territory_count() as f64
        + p.explored.len() as f64
        + 0.5 * p.energy as f64
        + p.kills as f64
        - 0.5 * p.invalid_move_strikes as f64
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub participant: ParticipantId,
    pub score: f64,
}

/// Living participants by descending score. Equal scores keep input order.
pub fn rank<'a>(participants: impl IntoIterator<Item = &'a Participant>) -> Vec<RankEntry> {
    let mut entries: Vec<RankEntry> = participants
        .into_iter()
        .filter(|p| p.is_alive())
        .map(|p| RankEntry {
            participant: p.id,
            score: timeout_score(p),
        })
        .collect();
    entries.sort_by(|a, b| b.score.total_cmp(&a.score));
    entries
}

/// Highest-scoring living participant; the first seen wins ties
pub fn timeout_winner<'a>(
    participants: impl IntoIterator<Item = &'a Participant>,
) -> Option<ParticipantId> {
    let mut best: Option<(ParticipantId, f64)> = None;
    for p in participants.into_iter().filter(|p| p.is_alive()) {
        let score = timeout_score(p);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((p.id, score)),
        }
    }
    best.map(|(id, _)| id)
}

// ============================================================================
// STANDINGS
// ============================================================================

/// A participant's final line in the match summary
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub participant: ParticipantId,
    pub name: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elimination: Option<EliminationReason>,
    pub objective_progress: f64,
    pub kills: u32,
    pub territories: usize,
    pub final_health: i32,
    pub final_energy: i32,
    pub score: f64,
}

fn status_rank(status: Status) -> u8 {
    match status {
        Status::Winner => 0,
        Status::Alive | Status::LostByTiebreak => 1,
        Status::Eliminated => 2,
    }
}

/// Winner first, then survivors, then the eliminated; each group by
/// descending progress
pub fn standings<'a>(participants: impl IntoIterator<Item = &'a Participant>) -> Vec<Standing> {
    let mut rows: Vec<Standing> = participants
        .into_iter()
        .map(|p| Standing {
            participant: p.id,
            name: p.name.clone(),
            status: p.status,
            elimination: p.elimination,
            objective_progress: p.objective_progress,
            kills: p.kills,
            territories: p.territory_count(),
            final_health: p.health,
            final_energy: p.energy,
            score: timeout_score(p),
        })
        .collect();

    rows.sort_by(|a, b| {
        status_rank(a.status)
            .cmp(&status_rank(b.status))
            .then(b.objective_progress.total_cmp(&a.objective_progress))
            .then(a.participant.cmp(&b.participant))
    });
    rows
}
