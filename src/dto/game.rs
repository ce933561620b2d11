use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    catalog::{CountryRecord, FilterCriteria, GameMode, SovereigntyFilter, UNKNOWN_CAPITAL},
    dto::phase::PhaseSnapshot,
    state::session::{SessionOutcome, TeamId, TeamScores},
};

/// Continent value meaning "no continent filter".
pub const ALL_CONTINENTS: &str = "All";

fn default_continent() -> String {
    ALL_CONTINENTS.to_string()
}

fn default_sovereignty() -> SovereigntyFilter {
    SovereigntyFilter::All
}

fn default_game_mode() -> GameMode {
    GameMode::Flags
}

fn default_shuffle() -> bool {
    true
}

/// Payload used to start a new quiz session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StartSessionRequest {
    /// Continent to play, or `All`.
    #[serde(default = "default_continent")]
    #[validate(length(min = 1))]
    pub continent: String,
    /// Sovereignty filter: `All`, `Yes`, or `No`.
    #[serde(default = "default_sovereignty")]
    pub sovereignty: SovereigntyFilter,
    /// Optional cap on the number of countries played.
    #[serde(default)]
    pub max_count: Option<usize>,
    /// Quiz variant for the session.
    #[serde(default = "default_game_mode")]
    pub game_mode: GameMode,
    /// Whether the session auto-advances without manual scoring.
    #[serde(default)]
    pub practice: bool,
    /// Whether the round order is shuffled.
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
}

impl StartSessionRequest {
    /// Translate the request into the catalog's filter criteria.
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            continent: (self.continent != ALL_CONTINENTS).then(|| self.continent.clone()),
            sovereignty: self.sovereignty,
            max_count: self.max_count,
            game_mode: self.game_mode,
            practice: self.practice,
        }
    }
}

/// Summary returned once a session has been started.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSummary {
    /// Identifier of the freshly started session.
    pub session_id: Uuid,
    /// Number of rounds in the sequence.
    pub total_rounds: usize,
    /// Quiz variant for the session.
    pub game_mode: GameMode,
    /// Whether the session auto-advances.
    pub practice: bool,
    /// Whether the round order was shuffled.
    pub shuffled: bool,
    /// Countdown duration per round, in seconds.
    pub countdown_secs: u64,
}

/// Generic acknowledgement for reveal/end actions.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Whether the action changed anything. Stale UI events yield `false`.
    pub processed: bool,
    /// Human-readable description of what happened.
    pub message: String,
}

impl ActionResponse {
    /// Acknowledge a processed action.
    pub fn processed(message: impl Into<String>) -> Self {
        Self {
            processed: true,
            message: message.into(),
        }
    }

    /// Acknowledge an action that was a no-op in the current state.
    pub fn ignored(message: impl Into<String>) -> Self {
        Self {
            processed: false,
            message: message.into(),
        }
    }
}

/// Result of a team-score action.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreResponse {
    /// Whether a point was registered.
    pub processed: bool,
    /// Whether the action was reinterpreted as a reveal instead.
    pub revealed: bool,
    /// Team that scored, when a point was registered.
    #[schema(value_type = Option<String>)]
    pub team: Option<TeamId>,
    /// New score of that team.
    pub score: Option<u32>,
    /// Whether this score consumed the final round.
    pub finished: bool,
}

/// Scoreboard snapshot for responses and events.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct ScoreboardSummary {
    /// Rounds claimed by the red team.
    pub red: u32,
    /// Rounds nobody claimed.
    pub draw: u32,
    /// Rounds claimed by the green team.
    pub green: u32,
}

impl From<TeamScores> for ScoreboardSummary {
    fn from(value: TeamScores) -> Self {
        Self {
            red: value.red,
            draw: value.draw,
            green: value.green,
        }
    }
}

/// Final standing serialised for clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeSummary {
    /// A single team holds the highest score.
    Winner {
        /// The winning team.
        #[schema(value_type = String)]
        team: TeamId,
    },
    /// Red and green finished level.
    Tie,
    /// Unclaimed rounds alone hold the maximum.
    MostDraws,
}

impl From<SessionOutcome> for OutcomeSummary {
    fn from(value: SessionOutcome) -> Self {
        match value {
            SessionOutcome::Winner(team) => OutcomeSummary::Winner { team },
            SessionOutcome::Tie => OutcomeSummary::Tie,
            SessionOutcome::MostDraws => OutcomeSummary::MostDraws,
        }
    }
}

/// Answer payload exposed once a round is revealed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnswerSummary {
    /// English display name.
    pub english_name: String,
    /// Local-language display name.
    pub local_name: String,
    /// Capital, only present in capitals mode; falls back to the dataset's
    /// unknown-capital marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital: Option<String>,
}

impl AnswerSummary {
    /// Build the reveal payload for a country under the session's mode.
    pub fn for_round(country: &CountryRecord, game_mode: GameMode) -> Self {
        Self {
            english_name: country.english_name.clone(),
            local_name: country.local_name.clone(),
            capital: match game_mode {
                GameMode::Flags => None,
                GameMode::Capitals => Some(
                    country
                        .capital
                        .clone()
                        .unwrap_or_else(|| UNKNOWN_CAPITAL.to_string()),
                ),
            },
        }
    }
}

/// Current round as seen by clients polling the session snapshot.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundSummary {
    /// One-based round number.
    pub round: usize,
    /// Total rounds in the session.
    pub total: usize,
    /// Flag image to display.
    pub flag_url: String,
    /// Answer, present only when the round has been revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<AnswerSummary>,
}

/// Full session snapshot returned by `GET /session`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSnapshot {
    /// Phase and transition version.
    pub phase: PhaseSnapshot,
    /// Session details, absent while no session has ever been started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionDetail>,
}

/// Per-session details inside [`SessionSnapshot`].
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionDetail {
    /// Identifier of the session.
    pub session_id: Uuid,
    /// Zero-based index of the current round.
    pub current_index: usize,
    /// Total rounds in the sequence.
    pub total_rounds: usize,
    /// Scoreboard for the three slots.
    pub scores: ScoreboardSummary,
    /// Quiz variant.
    pub game_mode: GameMode,
    /// Whether the session auto-advances.
    pub practice: bool,
    /// Current round, absent once the sequence is exhausted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundSummary>,
}

/// Count of records matching a filter, bounding the UI max-count input.
#[derive(Debug, Serialize, ToSchema)]
pub struct CountResponse {
    /// Number of records surviving the filter chain without truncation.
    pub count: usize,
}

/// Query parameters for the catalog count endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CountQuery {
    /// Continent to keep, or `All`.
    #[serde(default = "default_continent")]
    pub continent: String,
    /// Sovereignty filter: `All`, `Yes`, or `No`.
    #[serde(default = "default_sovereignty")]
    pub sovereignty: SovereigntyFilter,
}

impl CountQuery {
    /// Translate the query into catalog filter criteria (no cap, mode is
    /// irrelevant to counting).
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            continent: (self.continent != ALL_CONTINENTS).then(|| self.continent.clone()),
            sovereignty: self.sovereignty,
            max_count: None,
            game_mode: GameMode::Flags,
            practice: false,
        }
    }
}
