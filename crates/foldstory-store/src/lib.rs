//! Storage backends for session records.

pub mod memory_repository;

pub use memory_repository::MemorySessionRepository;
