//! Library crate for flagquiz-back, exposing modules for the binary and integration tests.

pub mod catalog;
pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod sequence;
pub mod services;
pub mod state;
pub mod timer;
