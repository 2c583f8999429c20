//! Domain model for the writing-session engine.

pub mod commands;
pub mod policy;
pub mod session;
pub(crate) mod turns;
pub(crate) mod votes;
