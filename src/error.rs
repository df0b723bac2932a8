//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error code string.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication Errors**: Bad credentials, missing or expired sessions
/// - **Resource Errors**: Requested records not found
/// - **Business Logic Errors**: Duplicates, illegal review transitions
/// - **Integration Errors**: Razorpay or mail provider failures
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Bearer session is missing, malformed or expired.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid or expired session")]
    InvalidToken,

    /// Email/password pair did not match a user.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Authenticated, but not allowed to do this.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("{0}")]
    Forbidden(String),

    /// Requested record does not exist.
    ///
    /// Returns HTTP 404 Not Found. The payload names the record kind.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// A unique field (usually an email) is already taken.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{0}")]
    Duplicate(String),

    /// Review status change not permitted from the current status.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("{0}")]
    InvalidTransition(String),

    /// Payment signature did not verify.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The user has no connected mailbox.
    #[error("Email not connected")]
    EmailNotConnected,

    /// The mail provider rejected the stored credentials.
    #[error("Email authentication failed. Please reconnect your email account.")]
    EmailAuthExpired,

    /// An optional integration has no credentials configured.
    ///
    /// Returns HTTP 503 Service Unavailable.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// A third-party API call failed.
    ///
    /// Returns HTTP 502 Bad Gateway.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Anything else that is our fault.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl AppError {
    /// Status code and stable error code for this variant.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::Duplicate(_) => (StatusCode::BAD_REQUEST, "duplicate"),
            AppError::InvalidTransition(_) => (StatusCode::CONFLICT, "invalid_transition"),
            AppError::InvalidSignature => (StatusCode::BAD_REQUEST, "invalid_signature"),
            AppError::EmailNotConnected => (StatusCode::BAD_REQUEST, "email_not_connected"),
            AppError::EmailAuthExpired => (StatusCode::UNAUTHORIZED, "email_auth_expired"),
            AppError::NotConfigured(_) => (StatusCode::SERVICE_UNAVAILABLE, "not_configured"),
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Database, internal and upstream failures are logged here and their
/// details are hidden from the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                "An internal error occurred".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                "An internal error occurred".to_string()
            }
            AppError::Upstream(detail) => {
                tracing::warn!(error = %detail, "upstream call failed");
                "An upstream service failed".to_string()
            }
            AppError::InvalidRequest(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Map a unique-constraint violation to `Duplicate`, everything else to `Database`.
pub fn duplicate_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Duplicate(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

/// Hand-built database errors for unit tests.
#[cfg(test)]
pub mod testing {
    use std::{error::Error as StdError, fmt};

    use sqlx::error::{DatabaseError, ErrorKind};

    #[derive(Debug)]
    struct UniqueViolation;

    impl fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("duplicate key value violates unique constraint")
        }
    }

    impl StdError for UniqueViolation {}

    impl DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    pub fn unique_violation() -> sqlx::Error {
        sqlx::Error::Database(Box::new(UniqueViolation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn duplicate_maps_to_bad_request() {
        let response = AppError::Duplicate("User already exists".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "duplicate");
        assert_eq!(body["error"]["message"], "User already exists");
    }

    #[tokio::test]
    async fn internal_details_are_hidden() {
        let response = AppError::Internal("argon2 blew up".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }

    #[test]
    fn not_found_names_the_record() {
        assert_eq!(AppError::NotFound("Investor").to_string(), "Investor not found");
        assert_eq!(
            AppError::InvalidTransition("x".into()).status_and_code().0,
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn unique_violations_become_duplicate_responses() {
        let err = duplicate_on_unique(testing::unique_violation(), "User already exists");
        assert!(matches!(err, AppError::Duplicate(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "duplicate");
        assert_eq!(body["error"]["message"], "User already exists");
    }

    #[test]
    fn other_database_errors_stay_internal() {
        let err = duplicate_on_unique(sqlx::Error::RowNotFound, "User already exists");
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(err.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
