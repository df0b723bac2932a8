//! Founder account endpoints.
//!
//! - POST /api/auth/signup - Create an account and log in
//! - POST /api/auth/login - Exchange email and password for a session token
//! - POST /api/auth/logout - End the presented session

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::{
    config::Config,
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::user::{AuthResponse, LoginRequest, SignupRequest},
    services::auth_service,
};

/// Create a founder account.
///
/// # Request Body
///
/// ```json
/// { "name": "Ada", "email": "ada@example.com", "password": "secret1" }
/// ```
///
/// # Response
///
/// - **201 Created**: `{user, token}`
/// - **400**: validation failure or email already registered
pub async fn signup(
    State(pool): State<DbPool>,
    State(config): State<Arc<Config>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let response = auth_service::signup(&pool, request, config.session_ttl_days).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Log in with email and password.
///
/// # Response
///
/// - **200 OK**: `{user, token}`
/// - **401**: unknown email or wrong password
/// - **403**: account suspended or deleted
pub async fn login(
    State(pool): State<DbPool>,
    State(config): State<Arc<Config>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = auth_service::login(&pool, request, config.session_ttl_days).await?;
    Ok(Json(response))
}

pub async fn logout(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth_service::logout(&pool, auth.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
