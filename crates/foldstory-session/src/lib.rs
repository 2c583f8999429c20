//! Foldstory — the writing-session engine.
//!
//! Owns the session lifecycle: turn rotation, segment submission,
//! pass/leave, early-termination voting, and the read views. All
//! invariant enforcement lives here; callers only see tagged results.

pub mod application;
pub mod domain;
