//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.
//! They can:
//! - Authenticate requests
//! - Record what admins did
//! - Short-circuit requests (reject unauthorized)

/// Admin audit trail
pub mod activity;
/// Bearer session authentication and the admin gate
pub mod auth;
