//! Mailbox connection, sending and open-tracking endpoints.
//!
//! - GET /api/auth/google, /api/auth/outlook - Consent URL for the caller
//! - GET /api/auth/{provider}/callback - Provider redirect target (public)
//! - GET /api/email/status - Connected mailbox, if any
//! - DELETE /api/email/connection - Forget the stored tokens
//! - POST /api/email/send - Send from the connected mailbox
//! - GET /api/email/track/{id} - Tracking pixel (public)

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    config::Config,
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::email::{
        AuthUrlResponse, EmailProvider, EmailStatusResponse, OAuthCallbackQuery,
        SendEmailRequest, SendEmailResponse,
    },
    services::email_service,
    state::AppState,
};

fn consent_url(
    config: &Config,
    provider: EmailProvider,
    auth: &AuthContext,
) -> Result<Json<AuthUrlResponse>, AppError> {
    let client = email_service::client_config(config, provider)?;
    let state = email_service::sign_state(config.state_secret(), provider, auth.user_id);
    let url = email_service::authorization_url(provider, &client, &state)?;
    Ok(Json(AuthUrlResponse { url }))
}

pub async fn google_auth(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<AuthUrlResponse>, AppError> {
    consent_url(&state.config, EmailProvider::Gmail, &auth)
}

pub async fn outlook_auth(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<AuthUrlResponse>, AppError> {
    consent_url(&state.config, EmailProvider::Outlook, &auth)
}

/// `{FRONTEND_URL}/email-settings` with the given query parameters.
fn settings_redirect(frontend_url: &str, params: &[(&str, &str)]) -> Redirect {
    let base = format!("{}/email-settings", frontend_url.trim_end_matches('/'));
    let target = url::Url::parse_with_params(&base, params)
        .map(String::from)
        .unwrap_or(base);
    Redirect::to(&target)
}

/// Short reason shown on the settings page after a failed connection.
fn failure_reason(err: &AppError) -> String {
    match err {
        AppError::InvalidRequest(reason) => reason.clone(),
        AppError::Database(_) | AppError::Internal(_) => "internal_error".to_string(),
        other => other.to_string(),
    }
}

async fn finish_connection(
    state: &AppState,
    provider: EmailProvider,
    query: OAuthCallbackQuery,
) -> Redirect {
    let frontend = state.config.frontend_url.as_str();

    let outcome = match (query.error, query.code, query.state) {
        (Some(error), _, _) => Err(AppError::InvalidRequest(error)),
        (None, None, _) => Err(AppError::InvalidRequest("no_code".to_string())),
        (None, _, None) => Err(AppError::InvalidRequest("no_state".to_string())),
        (None, Some(code), Some(signed_state)) => {
            email_service::complete_connection(
                &state.pool,
                &state.http,
                &state.config,
                provider,
                &code,
                &signed_state,
            )
            .await
        }
    };

    match outcome {
        Ok(_) => settings_redirect(
            frontend,
            &[("status", "success"), ("provider", provider.as_str())],
        ),
        Err(err) => {
            tracing::warn!(provider = provider.as_str(), error = %err, "mailbox connection failed");
            let reason = failure_reason(&err);
            settings_redirect(frontend, &[("status", "error"), ("message", reason.as_str())])
        }
    }
}

pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Redirect {
    finish_connection(&state, EmailProvider::Gmail, query).await
}

pub async fn outlook_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Redirect {
    finish_connection(&state, EmailProvider::Outlook, query).await
}

pub async fn status(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<EmailStatusResponse>, AppError> {
    Ok(Json(email_service::status(&pool, auth.user_id).await?))
}

pub async fn disconnect(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    email_service::disconnect(&pool, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Send an email from the caller's connected mailbox.
///
/// # Request Body
///
/// ```json
/// { "to": "sarah.chen@accel.com", "subject": "Intro", "body": "Hi Sarah,\n..." }
/// ```
///
/// # Errors
///
/// - **400** `email_not_connected`: no mailbox connected
/// - **401** `email_auth_expired`: the provider rejected the stored tokens
/// - **502**: the provider failed for another reason
pub async fn send(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>, AppError> {
    let log_id =
        email_service::send(&state.pool, &state.http, &state.config, auth.user_id, &request)
            .await?;

    Ok(Json(SendEmailResponse {
        success: true,
        message: "Email sent successfully",
        log_id,
    }))
}

/// Tracking pixel. Always answers with the GIF, whatever the id.
pub async fn track(State(pool): State<DbPool>, Path(id): Path<String>) -> Response {
    if let Ok(log_id) = uuid::Uuid::parse_str(&id) {
        match email_service::track_open(&pool, log_id).await {
            Ok(true) => tracing::debug!(%log_id, "email opened"),
            Ok(false) => {}
            Err(err) => tracing::warn!(%log_id, error = %err, "failed to record email open"),
        }
    }

    (
        [
            (header::CONTENT_TYPE, "image/gif"),
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
        ],
        email_service::TRACKING_PIXEL,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(redirect: Redirect) -> String {
        let response = redirect.into_response();
        response.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn success_redirect_names_the_provider() {
        let target = location(settings_redirect(
            "http://localhost:3000/",
            &[("status", "success"), ("provider", "gmail")],
        ));
        assert_eq!(
            target,
            "http://localhost:3000/email-settings?status=success&provider=gmail"
        );
    }

    #[test]
    fn error_reasons_are_url_encoded() {
        let target = location(settings_redirect(
            "http://localhost:3000",
            &[("status", "error"), ("message", "access denied&more")],
        ));
        assert!(target.ends_with("status=error&message=access+denied%26more"));
    }

    #[test]
    fn internal_failures_are_not_leaked() {
        assert_eq!(
            failure_reason(&AppError::Internal("db password wrong".into())),
            "internal_error"
        );
        assert_eq!(
            failure_reason(&AppError::InvalidRequest("invalid_state".into())),
            "invalid_state"
        );
    }
}
