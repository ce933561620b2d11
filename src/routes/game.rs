use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::game::{
        ActionResponse, ScoreResponse, SessionSnapshot, SessionSummary, StartSessionRequest,
    },
    error::AppError,
    services::session_service::{self, ActionOutcome, ScoreOutcome},
    state::{SharedState, session::TeamId},
};

/// Routes handling the session lifecycle and scoring.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/session/start", post(start_session))
        .route("/session/end", post(end_session))
        .route("/session/reveal", post(reveal_round))
        .route("/session/score/{team}", post(score_team))
        .route("/session", get(session_snapshot))
}

/// Start a new quiz session over the filtered catalog.
#[utoipa::path(
    post,
    path = "/session/start",
    tag = "session",
    request_body = StartSessionRequest,
    responses(
        (status = 200, description = "Session started", body = SessionSummary),
        (status = 400, description = "No country matches the requested filters"),
        (status = 409, description = "A session is already running")
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<StartSessionRequest>>,
) -> Result<Json<SessionSummary>, AppError> {
    let summary = session_service::start_session(&state, payload).await?;
    Ok(Json(summary))
}

/// Terminate the running session and show the final scoreboard.
#[utoipa::path(
    post,
    path = "/session/end",
    tag = "session",
    responses((status = 200, description = "Session ended (or no-op)", body = ActionResponse))
)]
pub async fn end_session(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    let response = match session_service::end_session(&state).await? {
        ActionOutcome::Applied => ActionResponse::processed("session ended"),
        ActionOutcome::Ignored => ActionResponse::ignored("no session to end"),
    };
    Ok(Json(response))
}

/// Reveal the current round's answer.
#[utoipa::path(
    post,
    path = "/session/reveal",
    tag = "session",
    responses((status = 200, description = "Round revealed (or no-op)", body = ActionResponse))
)]
pub async fn reveal_round(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    let response = match session_service::reveal(&state).await? {
        ActionOutcome::Applied => ActionResponse::processed("round revealed"),
        ActionOutcome::Ignored => ActionResponse::ignored("no active round to reveal"),
    };
    Ok(Json(response))
}

/// Register a point for a team. The first click on a hidden answer reveals
/// it instead of scoring; unknown teams are acknowledged without effect.
#[utoipa::path(
    post,
    path = "/session/score/{team}",
    tag = "session",
    params(("team" = String, Path, description = "Team identifier: red, green, or draw (blue)")),
    responses((status = 200, description = "Score outcome", body = ScoreResponse))
)]
pub async fn score_team(
    State(state): State<SharedState>,
    Path(team): Path<String>,
) -> Result<Json<ScoreResponse>, AppError> {
    let outcome = session_service::score_team(&state, TeamId::parse(&team)).await?;
    let response = match outcome {
        ScoreOutcome::Scored {
            team,
            score,
            finished,
        } => ScoreResponse {
            processed: true,
            revealed: false,
            team: Some(team),
            score: Some(score),
            finished,
        },
        ScoreOutcome::RevealedInstead => ScoreResponse {
            processed: false,
            revealed: true,
            team: None,
            score: None,
            finished: false,
        },
        ScoreOutcome::Ignored => ScoreResponse {
            processed: false,
            revealed: false,
            team: None,
            score: None,
            finished: false,
        },
    };
    Ok(Json(response))
}

/// Full snapshot of the engine for clients that poll instead of streaming.
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses((status = 200, description = "Current session snapshot", body = SessionSnapshot))
)]
pub async fn session_snapshot(State(state): State<SharedState>) -> Json<SessionSnapshot> {
    Json(session_service::snapshot(&state).await)
}
