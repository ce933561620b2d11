use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::{SessionPhase, Snapshot};

/// Publicly visible session phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// No active session.
    Idle,
    /// A flag is shown, the answer is hidden, the countdown runs.
    RoundActive,
    /// The answer is visible and scoring is enabled.
    RoundRevealed,
    /// The session is over; final scores are displayed.
    Ended,
}

impl From<SessionPhase> for VisiblePhase {
    fn from(value: SessionPhase) -> Self {
        match value {
            SessionPhase::Idle => VisiblePhase::Idle,
            SessionPhase::RoundActive => VisiblePhase::RoundActive,
            SessionPhase::RoundRevealed => VisiblePhase::RoundRevealed,
            SessionPhase::Ended => VisiblePhase::Ended,
        }
    }
}

/// Phase plus transition version, broadcast on every applied transition.
#[derive(Debug, Serialize, ToSchema, Clone, Copy)]
pub struct PhaseSnapshot {
    /// Current visible phase.
    pub phase: VisiblePhase,
    /// Number of transitions applied so far.
    pub version: usize,
}

impl From<Snapshot> for PhaseSnapshot {
    fn from(value: Snapshot) -> Self {
        Self {
            phase: value.phase.into(),
            version: value.version,
        }
    }
}
