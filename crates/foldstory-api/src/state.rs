//! Shared application state.

use std::sync::{Arc, Mutex};

use foldstory_core::clock::Clock;
use foldstory_core::repository::SessionRepository;
use foldstory_core::tokens::TokenSource;
use foldstory_session::domain::policy::EnginePolicy;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session record storage.
    pub repository: Arc<dyn SessionRepository>,
    /// Time source; injected so tests control expiry.
    pub clock: Arc<dyn Clock>,
    /// Id and token generation; injected so tests are deterministic.
    pub tokens: Arc<Mutex<dyn TokenSource + Send>>,
    /// Game policy knobs.
    pub policy: Arc<EnginePolicy>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        clock: Arc<dyn Clock>,
        tokens: Arc<Mutex<dyn TokenSource + Send>>,
        policy: Arc<EnginePolicy>,
    ) -> Self {
        Self {
            repository,
            clock,
            tokens,
            policy,
        }
    }
}
