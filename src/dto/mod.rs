//! Serde types crossing the HTTP and SSE boundary.

pub mod game;
pub mod health;
pub mod phase;
pub mod sse;
