//! User data models and API request/response types.
//!
//! This module defines:
//! - `User`: Database entity, including the password hash
//! - `UserResponse`: What clients see (never the hash)
//! - Signup/login bodies and the admin list filters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    query::{empty_as_none, flexible_datetime, parsed_or_none},
    subscription::{Subscription, SubscriptionPlan, SubscriptionStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Founder,
    Investor,
    Admin,
    Superadmin,
}

impl UserType {
    /// Whether this user may call `/api/admin` routes.
    pub fn is_admin(self) -> bool {
        matches!(self, UserType::Admin | UserType::Superadmin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Founder => "founder",
            UserType::Investor => "investor",
            UserType::Admin => "admin",
            UserType::Superadmin => "superadmin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Suspended,
    Deleted,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "suspended",
            AccountStatus::Deleted => "deleted",
        }
    }
}

/// Represents a user record from the database.
///
/// # Database Table
///
/// Maps to the `users` table. Emails are stored lowercased and are unique.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,

    /// Argon2 PHC string
    pub password_hash: String,

    pub user_type: UserType,
    pub subscription_plan: SubscriptionPlan,
    pub subscription_status: SubscriptionStatus,
    pub signup_date: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,

    /// 0..=100, enforced by a CHECK constraint
    pub profile_completion: i32,

    pub account_status: AccountStatus,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User as returned to API clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub user_type: UserType,
    pub subscription_plan: SubscriptionPlan,
    pub subscription_status: SubscriptionStatus,
    pub signup_date: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub profile_completion: i32,
    pub account_status: AccountStatus,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Convert database User to API UserResponse, dropping the password hash.
impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            user_type: user.user_type,
            subscription_plan: user.subscription_plan,
            subscription_status: user.subscription_status,
            signup_date: user.signup_date,
            last_login: user.last_login,
            profile_completion: user.profile_completion,
            account_status: user.account_status,
            metadata: user.metadata,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Request body for `POST /api/auth/signup`.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for `POST /api/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Compact user shape returned with a fresh session token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub user_type: UserType,
}

/// Response body for signup and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: SessionUser,
    pub token: String,
}

/// Response body for `GET /api/user/profile`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub name: String,
    pub email: String,
    pub profile_completion: i32,
    pub current_plan: &'static str,
    pub subscription_status: SubscriptionStatus,
}

/// Query parameters for `GET /api/admin/users`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilters {
    #[serde(default, deserialize_with = "parsed_or_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "parsed_or_none")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub subscription_plan: Option<SubscriptionPlan>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub subscription_status: Option<SubscriptionStatus>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub account_status: Option<AccountStatus>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub user_type: Option<UserType>,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub end_date: Option<DateTime<Utc>>,
}

/// Request body for `PATCH /api/admin/users/{id}/status`.
///
/// Kept as a raw string so an unknown value yields a 400 with a clear
/// message rather than a JSON rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserStatusRequest {
    pub account_status: String,
}

/// Response body for `GET /api/admin/users/{id}`.
#[derive(Debug, Serialize)]
pub struct UserDetails {
    pub user: UserResponse,
    pub subscription: Option<Subscription>,
}

/// Row of the "recent signups" dashboard table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSignup {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub user_type: UserType,
    pub account_status: AccountStatus,
    pub signup_date: DateTime<Utc>,
}

/// Parse the status string of an admin status update.
pub fn parse_account_status(value: &str) -> Option<AccountStatus> {
    match value {
        "active" => Some(AccountStatus::Active),
        "suspended" => Some(AccountStatus::Suspended),
        "deleted" => Some(AccountStatus::Deleted),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admin_roles_are_admins() {
        assert!(UserType::Admin.is_admin());
        assert!(UserType::Superadmin.is_admin());
        assert!(!UserType::Founder.is_admin());
        assert!(!UserType::Investor.is_admin());
    }

    #[test]
    fn account_status_parsing_is_strict() {
        assert_eq!(parse_account_status("suspended"), Some(AccountStatus::Suspended));
        assert_eq!(parse_account_status("Suspended"), None);
        assert_eq!(parse_account_status("banned"), None);
    }
}
