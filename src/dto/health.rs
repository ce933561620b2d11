use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status (always "ok" once the catalog loaded).
    pub status: String,
    /// Number of countries available in the catalog.
    pub countries: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(countries: usize) -> Self {
        Self {
            status: "ok".to_string(),
            countries,
        }
    }
}
