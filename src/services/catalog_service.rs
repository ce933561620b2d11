//! Read-only catalog queries used by the session setup screen.

use crate::{
    dto::game::{CountQuery, CountResponse},
    state::SharedState,
};

/// Count the records a filter combination would play, ignoring any cap.
///
/// The UI uses this to bound its max-count input before starting a session.
pub fn count(state: &SharedState, query: &CountQuery) -> CountResponse {
    CountResponse {
        count: state.catalog().count(&query.criteria()),
    }
}

/// Sorted list of distinct continents present in the catalog.
pub fn continents(state: &SharedState) -> Vec<String> {
    state.catalog().continents()
}
