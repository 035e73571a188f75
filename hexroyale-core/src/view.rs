//! Serializable projections of match state: the per-participant scoped view
//! handed to decision sources, and the full snapshot for external viewers

use serde::{Deserialize, Serialize};

use crate::board::CellKind;
use crate::game::Match;
use crate::hex::Hex;
use crate::log::{ActionRecord, EndReason};
use crate::player::{Participant, ParticipantId, Status};

/// Partial stats of a peer inside the viewer's vision
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeerView {
    pub id: ParticipantId,
    pub name: String,
    pub position: Hex,
    pub health: i32,
    pub energy: i32,
    pub status: Status,
    pub objective_progress: f64,
    pub territories: usize,
}

impl PeerView {
    fn of(p: &Participant) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            position: p.position,
            health: p.health,
            energy: p.energy,
            status: p.status,
            objective_progress: p.objective_progress,
            territories: p.territory_count(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellView {
    pub hex: Hex,
    pub kind: CellKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ParticipantId>,
    pub resource_consumed: bool,
    pub defense: i32,
}

/// Everything a decision source is shown for one turn
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParticipantView {
    pub assigned_id: ParticipantId,
    pub challenge: String,
    pub round: u32,
    pub turn: u32,
    pub max_rounds: u32,
    pub elapsed_secs: f64,
    pub remaining_secs: f64,
    pub me: Participant,
    pub peers: Vec<PeerView>,
    pub board_radius: i32,
    pub cells: Vec<CellView>,
    pub alive: Vec<ParticipantId>,
    pub history: Vec<ActionRecord>,
}

impl ParticipantView {
    /// Owner of a cell, if the cell exists and is owned
    pub fn owner_of(&self, hex: Hex) -> Option<ParticipantId> {
        self.cells.iter().find(|c| c.hex == hex).and_then(|c| c.owner)
    }

    pub fn has_cell(&self, hex: Hex) -> bool {
        self.cells.iter().any(|c| c.hex == hex)
    }

    pub fn peer(&self, id: ParticipantId) -> Option<&PeerView> {
        self.peers.iter().find(|p| p.id == id)
    }
}

/// Public stats of one participant in a full snapshot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub id: ParticipantId,
    pub name: String,
    pub color: String,
    pub position: Hex,
    pub energy: i32,
    pub health: i32,
    pub shield: i32,
    pub status: Status,
    pub objective_progress: f64,
    pub territories: usize,
    pub kills: u32,
    pub explored: usize,
}

/// Full match state for external viewers
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub challenge: String,
    pub round: u32,
    pub turn: u32,
    pub max_rounds: u32,
    pub elapsed_secs: f64,
    pub time_limit_secs: u64,
    pub over: bool,
    pub winner: Option<ParticipantId>,
    pub end_reason: Option<EndReason>,
    pub participants: Vec<ParticipantSummary>,
    pub cells: Vec<CellView>,
    pub alive: Vec<ParticipantId>,
    pub history: Vec<ActionRecord>,
}

impl Match {
    fn cell_views(&self) -> Vec<CellView> {
        self.board
            .cells()
            .map(|(hex, cell)| CellView {
                hex,
                kind: cell.kind,
                owner: cell.owner,
                resource_consumed: cell.resource_consumed,
                defense: cell.defense,
            })
            .collect()
    }

    /// The view scoped to one participant: own record in full, visible peers
    /// in part, the whole board map
    pub fn view_for(&self, id: ParticipantId) -> Option<ParticipantView> {
        let me = self.participants.get(&id)?;
        let peers = me
            .visible_peers
            .iter()
            .filter_map(|pid| self.participants.get(pid))
            .filter(|p| p.is_alive())
            .map(PeerView::of)
            .collect();

        Some(ParticipantView {
            assigned_id: id,
            challenge: self.config.challenge.clone(),
            round: self.round(),
            turn: self.turn(),
            max_rounds: self.config.max_rounds,
            board_radius: self.board.radius(),
            elapsed_secs: self.elapsed().as_secs_f64(),
            remaining_secs: self.remaining().as_secs_f64(),
            me: me.clone(),
            peers,
            cells: self.cell_views(),
            alive: self.alive_ids(),
            history: self.recent_history(self.config.history_limit).to_vec(),
        })
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        let participants = self
            .participants
            .values()
            .map(|p| ParticipantSummary {
                id: p.id,
                name: p.name.clone(),
                color: p.color.clone(),
                position: p.position,
                energy: p.energy,
                health: p.health,
                shield: p.shield,
                status: p.status,
                objective_progress: p.objective_progress,
                territories: p.territory_count(),
                kills: p.kills,
                explored: p.explored.len(),
            })
            .collect();

        MatchSnapshot {
            challenge: self.config.challenge.clone(),
            round: self.round(),
            turn: self.turn(),
            max_rounds: self.config.max_rounds,
            elapsed_secs: self.elapsed().as_secs_f64(),
            time_limit_secs: self.config.time_limit_secs,
            over: self.is_over(),
            winner: self.winner(),
            end_reason: self.end_reason(),
            participants,
            cells: self.cell_views(),
            alive: self.alive_ids(),
            history: self.recent_history(self.config.history_limit).to_vec(),
        }
    }
}
