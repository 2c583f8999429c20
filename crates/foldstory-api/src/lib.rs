//! Foldstory HTTP API.

pub mod error;
pub mod routes;
pub mod state;
