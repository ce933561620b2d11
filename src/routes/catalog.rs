use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::game::{CountQuery, CountResponse},
    services::catalog_service,
    state::SharedState,
};

/// Routes answering catalog queries for the session setup screen.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/catalog/count", get(catalog_count))
        .route("/catalog/continents", get(catalog_continents))
}

/// Count the countries a filter combination would play.
#[utoipa::path(
    get,
    path = "/catalog/count",
    tag = "catalog",
    params(
        ("continent" = Option<String>, Query, description = "Continent to keep, or `All`"),
        ("sovereignty" = Option<String>, Query, description = "Sovereignty filter: `All`, `Yes`, or `No`")
    ),
    responses((status = 200, description = "Matching record count", body = CountResponse))
)]
pub async fn catalog_count(
    State(state): State<SharedState>,
    Query(query): Query<CountQuery>,
) -> Json<CountResponse> {
    Json(catalog_service::count(&state, &query))
}

/// Sorted list of distinct continents present in the catalog.
#[utoipa::path(
    get,
    path = "/catalog/continents",
    tag = "catalog",
    responses((status = 200, description = "Distinct continents", body = Vec<String>))
)]
pub async fn catalog_continents(State(state): State<SharedState>) -> Json<Vec<String>> {
    Json(catalog_service::continents(&state))
}
