//! Shared test doubles for the Foldstory session engine.

mod clock;
mod repository;
mod tokens;

pub use clock::FixedClock;
pub use repository::FailingSessionRepository;
pub use tokens::SequenceTokens;
