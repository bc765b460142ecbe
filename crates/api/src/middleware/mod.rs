//! Request extractors shared by handlers.
//!
//! - [`auth::AuthUser`] -- Resolves the workflow actor from a JWT Bearer token.

pub mod auth;
