/// Catalog queries backing the filter UI.
pub mod catalog_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Core session engine: lifecycle, scoring, and timer callbacks.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Scheduled tokio tasks behind the engine's timer slots.
pub mod timer_service;
