use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Flag Quiz Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::event_stream,
        crate::routes::game::start_session,
        crate::routes::game::end_session,
        crate::routes::game::reveal_round,
        crate::routes::game::score_team,
        crate::routes::game::session_snapshot,
        crate::routes::catalog::catalog_count,
        crate::routes::catalog::catalog_continents,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::StartSessionRequest,
            crate::dto::game::SessionSummary,
            crate::dto::game::ActionResponse,
            crate::dto::game::ScoreResponse,
            crate::dto::game::SessionSnapshot,
            crate::dto::game::SessionDetail,
            crate::dto::game::RoundSummary,
            crate::dto::game::AnswerSummary,
            crate::dto::game::ScoreboardSummary,
            crate::dto::game::OutcomeSummary,
            crate::dto::game::CountResponse,
            crate::dto::phase::VisiblePhase,
            crate::dto::phase::PhaseSnapshot,
            crate::catalog::GameMode,
            crate::catalog::SovereigntyFilter,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events stream"),
        (name = "session", description = "Quiz session lifecycle and scoring"),
        (name = "catalog", description = "Country catalog queries"),
    )
)]
pub struct ApiDoc;
