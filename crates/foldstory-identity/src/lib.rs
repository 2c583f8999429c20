//! Foldstory — anonymous identity resolution.
//!
//! Derives a stable anonymous identity from a durable client-side token so
//! the engine can tell "this browser instance" apart across polls without
//! an account system. Resolution never fails: when no token is present one
//! is minted and returned for the caller to persist client-side.

use sha2::{Digest, Sha256};

use foldstory_core::tokens::TokenSource;

/// Length of the hex portion of a derived identity.
pub const IDENTITY_LEN: usize = 32;

/// Length of a derived contributor id.
pub const CONTRIBUTOR_ID_LEN: usize = 16;

/// Outcome of resolving a client's anonymous identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResolution {
    /// The stable anonymous identity.
    pub identity: String,
    /// A newly minted durable token the caller must persist client-side.
    /// `None` when the client already presented one.
    pub minted_token: Option<String>,
}

/// Resolves the caller's anonymous identity from an optional durable token.
///
/// An empty token is treated the same as a missing one.
pub fn resolve(anon_token: Option<&str>, tokens: &mut dyn TokenSource) -> IdentityResolution {
    match anon_token {
        Some(token) if !token.is_empty() => IdentityResolution {
            identity: derive_identity(token),
            minted_token: None,
        },
        _ => {
            let minted = tokens.anon_token();
            let identity = derive_identity(&minted);
            IdentityResolution {
                identity,
                minted_token: Some(minted),
            }
        }
    }
}

/// Derives the contributor id for an identity within one session.
///
/// Stable across requests and unique per `(session, identity)` pair, so a
/// re-join by the same browser resolves to the same roster slot.
#[must_use]
pub fn contributor_id(session_id: &str, identity: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(b":");
    hasher.update(identity.as_bytes());
    truncated_hex(&hasher.finalize(), CONTRIBUTOR_ID_LEN)
}

fn derive_identity(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("anon-{}", truncated_hex(&digest, IDENTITY_LEN))
}

fn truncated_hex(bytes: &[u8], len: usize) -> String {
    let mut out = String::with_capacity(len);
    for byte in bytes {
        if out.len() >= len {
            break;
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out.truncate(len);
    out
}
