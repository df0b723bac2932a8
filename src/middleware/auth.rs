//! Bearer session authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the session token from the Authorization header
//! 2. Hash it and look up an unexpired session of an active user
//! 3. Inject authentication context into the request
//! 4. Reject unauthorized requests with HTTP 401
//!
//! `require_admin` is layered on top for the `/api/admin` tree.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{db::DbPool, error::AppError, models::user::UserType, services::auth_service};

/// Authentication context attached to authenticated requests.
///
/// Inserted into the request's extension map; handlers extract it with
/// `Extension<AuthContext>` to know who is calling.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,

    /// Session that authenticated this request, so logout can delete it
    pub session_id: Uuid,

    pub email: String,
    pub user_type: UserType,
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Session authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` header from request
/// 2. Hash the token with SHA-256
/// 3. Find the matching session, unexpired, owned by an active user
/// 4. If found: inject `AuthContext` into request, call next handler
/// 5. If not found: return 401 Unauthorized error
pub async fn session_auth(
    State(pool): State<DbPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).ok_or(AppError::InvalidToken)?;
    let session = auth_service::authenticate(&pool, token).await?;

    request.extensions_mut().insert(AuthContext {
        user_id: session.user_id,
        session_id: session.id,
        email: session.email,
        user_type: session.user_type,
    });

    Ok(next.run(request).await)
}

/// Reject authenticated callers that are not admins or superadmins.
///
/// Must run after `session_auth`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let is_admin = request
        .extensions()
        .get::<AuthContext>()
        .ok_or(AppError::InvalidToken)?
        .user_type
        .is_admin();

    if !is_admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(header: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/api/user/profile");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&request_with(Some("Bearer abc123"))), Some("abc123"));
        assert_eq!(bearer_token(&request_with(Some("Basic abc123"))), None);
        assert_eq!(bearer_token(&request_with(Some("Bearer   "))), None);
        assert_eq!(bearer_token(&request_with(None)), None);
    }
}
