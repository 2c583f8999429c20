//! Token generation abstraction for determinism.
//!
//! In production this wraps the thread RNG. In tests a scripted
//! implementation is injected so ids and capability tokens are repeatable.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of a session id as it appears in share links.
pub const SESSION_ID_LEN: usize = 8;

/// Length of a capability token (contributor and observer).
pub const CAPABILITY_TOKEN_LEN: usize = 32;

/// Length of a minted anonymous-identity token.
pub const ANON_TOKEN_LEN: usize = 32;

/// Abstraction over random id and token generation.
pub trait TokenSource: Send + Sync {
    /// Generate a candidate session id. Collision checking is the
    /// caller's responsibility.
    fn session_id(&mut self) -> String;

    /// Generate an opaque capability token.
    fn capability_token(&mut self) -> String;

    /// Generate a durable anonymous-identity token for a new client.
    fn anon_token(&mut self) -> String;
}

/// Production token source backed by the thread RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokens;

fn alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

impl TokenSource for RandomTokens {
    fn session_id(&mut self) -> String {
        alphanumeric(SESSION_ID_LEN).to_lowercase()
    }

    fn capability_token(&mut self) -> String {
        alphanumeric(CAPABILITY_TOKEN_LEN)
    }

    fn anon_token(&mut self) -> String {
        alphanumeric(ANON_TOKEN_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_lowercase_and_sized() {
        let id = RandomTokens.session_id();
        assert_eq!(id.len(), SESSION_ID_LEN);
        assert_eq!(id, id.to_lowercase());
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_capability_token_is_sized_and_alphanumeric() {
        let token = RandomTokens.capability_token();
        assert_eq!(token.len(), CAPABILITY_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_anon_token_is_sized() {
        assert_eq!(RandomTokens.anon_token().len(), ANON_TOKEN_LEN);
    }
}
