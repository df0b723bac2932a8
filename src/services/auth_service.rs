//! Account and session management.
//!
//! This service handles:
//! - Password hashing (argon2) and verification
//! - Signup and login, each issuing a fresh bearer session
//! - Resolving a presented bearer token back to its session
//! - Creating or promoting the bootstrap administrator at startup
//!
//! # Token Storage
//!
//! Session tokens are 32 random bytes, hex encoded, shown to the client
//! exactly once. Only their SHA-256 hash is stored.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    config::BootstrapAdmin,
    db::DbPool,
    error::{AppError, duplicate_on_unique},
    models::{
        session::SessionRecord,
        user::{AccountStatus, AuthResponse, LoginRequest, SessionUser, SignupRequest, User},
    },
    services::parsing::{is_valid_email, normalize_email},
};

const MIN_PASSWORD_LEN: usize = 6;

/// Hash a password into an argon2 PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|e| AppError::Internal(format!("salt encoding failed: {e}")))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Check a password against a stored PHC string. Malformed hashes never match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Fresh random bearer token (64 hex chars).
pub fn generate_token() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

/// SHA-256 hex digest under which a token is stored.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Create a founder account and log it in.
///
/// # Errors
///
/// - `InvalidRequest`: blank name, malformed email or short password
/// - `Duplicate`: email already registered
pub async fn signup(
    pool: &DbPool,
    request: SignupRequest,
    ttl_days: i64,
) -> Result<AuthResponse, AppError> {
    let name = request.name.trim();
    let email = normalize_email(&request.email);

    if name.is_empty() {
        return Err(AppError::InvalidRequest("Name is required".to_string()));
    }
    if !is_valid_email(&email) {
        return Err(AppError::InvalidRequest("Invalid email format".to_string()));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash = hash_password(&request.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password_hash, last_login)
        VALUES ($1, $2, $3, NOW())
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(&email)
    .bind(&password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| duplicate_on_unique(e, "User already exists"))?;

    let token = issue_session(pool, user.id, ttl_days).await?;
    tracing::info!(user_id = %user.id, "user signed up");

    Ok(AuthResponse {
        user: session_user(&user),
        token,
    })
}

/// Verify credentials and start a new session.
///
/// # Errors
///
/// - `InvalidCredentials`: unknown email or wrong password
/// - `Forbidden`: account is suspended or deleted
pub async fn login(
    pool: &DbPool,
    request: LoginRequest,
    ttl_days: i64,
) -> Result<AuthResponse, AppError> {
    let email = normalize_email(&request.email);

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }
    ensure_active(user.account_status)?;

    sqlx::query("UPDATE users SET last_login = NOW(), updated_at = NOW() WHERE id = $1")
        .bind(user.id)
        .execute(pool)
        .await?;

    let token = issue_session(pool, user.id, ttl_days).await?;

    Ok(AuthResponse {
        user: session_user(&user),
        token,
    })
}

fn ensure_active(status: AccountStatus) -> Result<(), AppError> {
    match status {
        AccountStatus::Active => Ok(()),
        other => Err(AppError::Forbidden(format!("Account is {}", other.as_str()))),
    }
}

fn session_user(user: &User) -> SessionUser {
    SessionUser {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        user_type: user.user_type,
    }
}

/// Store a new session for `user_id` and return the plaintext token.
pub async fn issue_session(pool: &DbPool, user_id: Uuid, ttl_days: i64) -> Result<String, AppError> {
    let token = generate_token();
    let expires_at = Utc::now() + Duration::days(ttl_days.max(1));

    sqlx::query("INSERT INTO sessions (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(hash_token(&token))
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(token)
}

/// Resolve a bearer token to an unexpired session of an active user.
pub async fn authenticate(pool: &DbPool, token: &str) -> Result<SessionRecord, AppError> {
    let session = sqlx::query_as::<_, SessionRecord>(
        r#"
        SELECT s.id, s.user_id, s.expires_at, u.email, u.user_type, u.account_status
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = $1 AND s.expires_at > NOW()
        "#,
    )
    .bind(hash_token(token))
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::InvalidToken)?;

    if session.account_status != AccountStatus::Active {
        return Err(AppError::InvalidToken);
    }

    Ok(session)
}

pub async fn logout(pool: &DbPool, session_id: Uuid) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Drop every session of a user, e.g. after suspension.
pub async fn revoke_user_sessions(pool: &DbPool, user_id: Uuid) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Create the configured administrator, or promote the existing account.
///
/// The password is only set when the account is created.
pub async fn ensure_bootstrap_admin(pool: &DbPool, admin: &BootstrapAdmin) -> Result<(), AppError> {
    let email = normalize_email(&admin.email);
    if !is_valid_email(&email) {
        return Err(AppError::InvalidRequest(format!(
            "BOOTSTRAP_ADMIN_EMAIL is not a valid email: {email}"
        )));
    }

    let promoted = sqlx::query(
        r#"
        UPDATE users
        SET user_type = 'admin', account_status = 'active', updated_at = NOW()
        WHERE email = $1 AND user_type NOT IN ('admin', 'superadmin')
        "#,
    )
    .bind(&email)
    .execute(pool)
    .await?
    .rows_affected();

    if promoted > 0 {
        tracing::info!(%email, "promoted existing user to admin");
        return Ok(());
    }

    let password_hash = hash_password(&admin.password)?;
    let created = sqlx::query(
        r#"
        INSERT INTO users (name, email, password_hash, user_type, subscription_plan, subscription_status)
        VALUES ($1, $2, $3, 'admin', 'enterprise', 'active')
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(&admin.name)
    .bind(&email)
    .bind(&password_hash)
    .execute(pool)
    .await?
    .rows_affected();

    if created > 0 {
        tracing::info!(%email, "created bootstrap admin");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn salts_differ_per_hash() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_password("anything", "plaintext-password"));
    }

    #[test]
    fn tokens_are_random_and_hashed_stably() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert_ne!(token, generate_token());
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn only_active_accounts_may_log_in() {
        assert!(ensure_active(AccountStatus::Active).is_ok());
        assert!(matches!(
            ensure_active(AccountStatus::Suspended),
            Err(AppError::Forbidden(msg)) if msg == "Account is suspended"
        ));
    }
}
