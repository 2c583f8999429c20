//! Application layer: command and query handlers over the repository.

pub mod command_handlers;
pub mod query_handlers;
