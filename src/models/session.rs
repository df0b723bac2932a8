//! Session model for bearer-token authentication.
//!
//! Tokens are handed to the client once, at login or signup. The database
//! only ever holds their SHA-256 hash.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::user::{AccountStatus, UserType};

/// Represents a session row joined with the fields of its user that the
/// auth middleware needs.
///
/// # Database Table
///
/// Maps to the `sessions` table with columns:
/// - `id`: Unique identifier (UUID)
/// - `user_id`: Owner of the session
/// - `token_hash`: SHA-256 hash of the bearer token
/// - `expires_at`: After this instant the token is rejected
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub email: String,
    pub user_type: UserType,
    pub account_status: AccountStatus,
}
