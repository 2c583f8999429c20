//! Foldstory — canonical share-link codec.
//!
//! Deterministic, bidirectional mapping between a `(session_id, role,
//! token)` triple and the byte-stable path
//! `/session/{sessionId}/{role}/{token}`. Links are persisted and shared
//! outside the system, so the format must never change shape.
//!
//! `parse_path` is the single source of truth for "is this a valid session
//! URL": it returns `None` for every malformed variant and never panics.

use serde::{Deserialize, Serialize};

/// Minimum length of a session id embedded in a link.
pub const MIN_SESSION_ID_LEN: usize = 8;

/// Minimum length of a capability token embedded in a link.
pub const MIN_TOKEN_LEN: usize = 16;

const PATH_PREFIX: &str = "session";

/// The capability role a link grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Write capability bound to one contributor slot.
    Contributor,
    /// Read-only capability for the whole session.
    Observer,
}

impl Role {
    /// Returns the literal path segment for this role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contributor => "contributor",
            Self::Observer => "observer",
        }
    }

    /// Type guard over the two recognized role literals. `None` for
    /// anything else, including the empty string.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "contributor" => Some(Self::Contributor),
            "observer" => Some(Self::Observer),
            _ => None,
        }
    }

    /// Returns true if `value` is a recognized role literal.
    #[must_use]
    pub fn is_role(value: &str) -> bool {
        Self::parse(value).is_some()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed capability link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLink {
    /// The session the link points at.
    pub session_id: String,
    /// The capability role the link grants.
    pub role: Role,
    /// The opaque bearer token.
    pub token: String,
}

/// Builds the canonical path for a capability link.
///
/// Inputs are assumed well-formed (ids and tokens come from the engine's
/// own generators); no validation beyond interpolation happens here.
#[must_use]
pub fn build_path(session_id: &str, role: Role, token: &str) -> String {
    format!("/{PATH_PREFIX}/{session_id}/{}/{token}", role.as_str())
}

/// Parses a canonical link path.
///
/// Returns `None` (never an error) for a missing leading slash, a wrong
/// prefix segment, a wrong segment count, an unrecognized role, a session
/// id shorter than [`MIN_SESSION_ID_LEN`], or a token shorter than
/// [`MIN_TOKEN_LEN`].
#[must_use]
pub fn parse_path(path: &str) -> Option<SessionLink> {
    let rest = path.strip_prefix('/')?;
    let mut parts = rest.split('/');

    if parts.next()? != PATH_PREFIX {
        return None;
    }
    let session_id = parts.next()?;
    let role = Role::parse(parts.next()?)?;
    let token = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    if session_id.len() < MIN_SESSION_ID_LEN || token.len() < MIN_TOKEN_LEN {
        return None;
    }

    Some(SessionLink {
        session_id: session_id.to_owned(),
        role,
        token: token.to_owned(),
    })
}
