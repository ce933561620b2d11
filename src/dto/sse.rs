use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    catalog::GameMode,
    dto::{
        game::{AnswerSummary, OutcomeSummary, ScoreboardSummary},
        phase::PhaseSnapshot,
    },
    state::session::TeamId,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    /// Optional SSE event name.
    pub event: Option<String>,
    /// Serialised JSON data field.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Build an event with a plain-text data field.
    pub fn new<E>(event: E, data: String) -> Self
    where
        E: Into<Option<String>>,
    {
        Self {
            event: event.into(),
            data,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever the session phase changes.
pub struct PhaseChangedEvent(pub PhaseSnapshot);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a new session starts.
pub struct SessionStartedEvent {
    /// Identifier of the session.
    pub session_id: Uuid,
    /// Number of rounds in the sequence.
    pub total_rounds: usize,
    /// Quiz variant.
    pub game_mode: GameMode,
    /// Whether the session auto-advances.
    pub practice: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a round's flag is presented, answer hidden.
pub struct RoundPresentedEvent {
    /// One-based round number for the progress display.
    pub round: usize,
    /// Total rounds in the session.
    pub total: usize,
    /// Flag image to display.
    pub flag_url: String,
    /// Countdown duration for this round, in seconds.
    pub countdown_secs: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the current round's answer becomes visible.
pub struct RoundRevealedEvent {
    /// One-based round number.
    pub round: usize,
    /// The answer payload; carries the capital in capitals mode.
    pub answer: AnswerSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a team claims a round.
pub struct ScoreUpdatedEvent {
    /// Team whose score changed.
    #[schema(value_type = String)]
    pub team: TeamId,
    /// New score for that team.
    pub score: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once per second for the whole-session elapsed display.
pub struct ElapsedTickEvent {
    /// Seconds elapsed since the session started.
    pub seconds: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once per second while a round countdown runs.
pub struct CountdownTickEvent {
    /// Seconds remaining before the automatic reveal.
    pub remaining: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the session reaches its final scoreboard.
pub struct SessionFinishedEvent {
    /// Final scoreboard.
    pub scores: ScoreboardSummary,
    /// Computed standing.
    pub outcome: OutcomeSummary,
    /// Why the session ended: `completed` or `stopped`.
    pub reason: String,
}
