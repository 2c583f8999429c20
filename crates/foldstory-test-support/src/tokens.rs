//! Test token source — deterministic `TokenSource` implementation.

use foldstory_core::tokens::{
    ANON_TOKEN_LEN, CAPABILITY_TOKEN_LEN, SESSION_ID_LEN, TokenSource,
};

/// A token source that returns scripted session ids first, then falls back
/// to counter-derived values of the correct lengths. Capability and anon
/// tokens are always counter-derived, so every issued token is distinct
/// and repeatable across test runs.
#[derive(Debug, Default)]
pub struct SequenceTokens {
    scripted_session_ids: Vec<String>,
    session_index: usize,
    session_counter: u64,
    token_counter: u64,
    anon_counter: u64,
}

impl SequenceTokens {
    /// Create a token source that yields the given session ids in order
    /// before falling back to generated ones. Used to script id collisions.
    #[must_use]
    pub fn with_session_ids(scripted_session_ids: Vec<String>) -> Self {
        Self {
            scripted_session_ids,
            ..Self::default()
        }
    }
}

impl TokenSource for SequenceTokens {
    fn session_id(&mut self) -> String {
        if self.session_index < self.scripted_session_ids.len() {
            let id = self.scripted_session_ids[self.session_index].clone();
            self.session_index += 1;
            return id;
        }
        self.session_counter += 1;
        let id = format!("sess{:04}", self.session_counter);
        debug_assert_eq!(id.len(), SESSION_ID_LEN);
        id
    }

    fn capability_token(&mut self) -> String {
        self.token_counter += 1;
        let token = format!("captoken{:024}", self.token_counter);
        debug_assert_eq!(token.len(), CAPABILITY_TOKEN_LEN);
        token
    }

    fn anon_token(&mut self) -> String {
        self.anon_counter += 1;
        let token = format!("anontoken{:023}", self.anon_counter);
        debug_assert_eq!(token.len(), ANON_TOKEN_LEN);
        token
    }
}
