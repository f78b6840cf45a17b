//! Authentication and authorization.
//!
//! - [`password`]: Argon2id hashing and verification
//! - [`session`]: session tokens, the [`session::SessionStore`] seam and its in-memory store
//! - [`current_session`]: axum extractor resolving the caller's session from the cookie
//! - [`policy`]: the allow/deny rules every handler applies before touching the store

pub mod current_session;
pub mod password;
pub mod policy;
pub mod session;
