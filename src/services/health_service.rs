use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a static health payload including the catalog size.
///
/// The catalog is loaded before the server starts listening, so a reachable
/// server is a healthy one.
pub fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse::ok(state.catalog().len())
}
