//! Foldstory Core — shared abstractions.
//!
//! This crate defines the error taxonomy and the traits the rest of the
//! engine depends on. It contains no game rules and no infrastructure code.

pub mod clock;
pub mod error;
pub mod repository;
pub mod tokens;
