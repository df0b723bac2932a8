//! Mailbox connection (Gmail / Outlook OAuth), outbound sending and open
//! tracking.
//!
//! # OAuth state
//!
//! The `state` parameter is `<user id>.<hex HMAC>` where the MAC covers the
//! provider name and the user id. The callback is unauthenticated, so the
//! signature is the only thing tying the returned code to a user.
//!
//! # Sending
//!
//! Every send writes an `email_logs` row first. Its id goes into the
//! tracking pixel URL, and the row is flipped to `Failed` if delivery fails.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD, prelude::BASE64_STANDARD};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::{
    config::{Config, OAuthClientConfig},
    db::DbPool,
    error::AppError,
    models::email::{
        Campaign, EmailProvider, EmailSettings, EmailStatusResponse, ProviderTokens,
        SendEmailRequest,
    },
    services::parsing::{is_valid_email, normalize_email},
};

type HmacSha256 = Hmac<Sha256>;

/// 1x1 transparent GIF served by the open-tracking endpoint.
pub const TRACKING_PIXEL: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x01, 0x44, 0x00, 0x3b,
];

struct Endpoints {
    authorize: &'static str,
    token: &'static str,
    profile: &'static str,
    scope: &'static str,
}

fn endpoints(provider: EmailProvider) -> Endpoints {
    match provider {
        EmailProvider::Gmail => Endpoints {
            authorize: "https://accounts.google.com/o/oauth2/v2/auth",
            token: "https://oauth2.googleapis.com/token",
            profile: "https://www.googleapis.com/oauth2/v2/userinfo",
            scope: "https://www.googleapis.com/auth/gmail.send https://www.googleapis.com/auth/userinfo.email",
        },
        EmailProvider::Outlook => Endpoints {
            authorize: "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
            token: "https://login.microsoftonline.com/common/oauth2/v2.0/token",
            profile: "https://graph.microsoft.com/v1.0/me",
            scope: "offline_access User.Read Mail.Send",
        },
    }
}

const GMAIL_SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";
const GRAPH_SEND_URL: &str = "https://graph.microsoft.com/v1.0/me/sendMail";

/// OAuth client registration for `provider`, or `NotConfigured`.
pub fn client_config(config: &Config, provider: EmailProvider) -> Result<OAuthClientConfig, AppError> {
    match provider {
        EmailProvider::Gmail => config.gmail().ok_or(AppError::NotConfigured("Gmail")),
        EmailProvider::Outlook => config.outlook().ok_or(AppError::NotConfigured("Outlook")),
    }
}

fn state_mac(secret: &str, provider: EmailProvider, user_id: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key length is valid");
    mac.update(provider.as_str().as_bytes());
    mac.update(b":");
    mac.update(user_id.as_bytes());
    mac
}

pub fn sign_state(secret: &str, provider: EmailProvider, user_id: Uuid) -> String {
    let user_id = user_id.to_string();
    let signature = hex::encode(state_mac(secret, provider, &user_id).finalize().into_bytes());
    format!("{user_id}.{signature}")
}

/// The user id carried by a state value, if its signature checks out.
pub fn verify_state(secret: &str, provider: EmailProvider, state: &str) -> Option<Uuid> {
    let (user_id, signature) = state.split_once('.')?;
    let signature = hex::decode(signature).ok()?;
    state_mac(secret, provider, user_id)
        .verify_slice(&signature)
        .ok()?;
    Uuid::parse_str(user_id).ok()
}

/// Provider consent screen URL carrying a signed `state`.
pub fn authorization_url(
    provider: EmailProvider,
    client: &OAuthClientConfig,
    state: &str,
) -> Result<String, AppError> {
    let ep = endpoints(provider);
    let mut params = vec![
        ("client_id", client.client_id.as_str()),
        ("redirect_uri", client.redirect_uri.as_str()),
        ("response_type", "code"),
        ("scope", ep.scope),
        ("state", state),
    ];
    if provider == EmailProvider::Gmail {
        // Google only returns a refresh token on forced consent.
        params.push(("access_type", "offline"));
        params.push(("prompt", "consent"));
    }

    let url = url::Url::parse_with_params(ep.authorize, &params)
        .map_err(|err| AppError::Internal(format!("authorize url: {err}")))?;
    Ok(url.into())
}

async fn token_request(
    http: &reqwest::Client,
    provider: EmailProvider,
    form: &[(&str, &str)],
) -> Result<ProviderTokens, AppError> {
    let response = http.post(endpoints(provider).token).form(form).send().await?;
    let status = response.status();
    if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED {
        let detail = response.text().await.unwrap_or_default();
        tracing::warn!(provider = provider.as_str(), %status, %detail, "token request rejected");
        return Err(AppError::EmailAuthExpired);
    }
    if !status.is_success() {
        return Err(AppError::Upstream(format!(
            "{} token endpoint returned {status}",
            provider.as_str()
        )));
    }
    Ok(response.json().await?)
}

async fn exchange_code(
    http: &reqwest::Client,
    provider: EmailProvider,
    client: &OAuthClientConfig,
    code: &str,
) -> Result<ProviderTokens, AppError> {
    token_request(
        http,
        provider,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
            ("redirect_uri", client.redirect_uri.as_str()),
            ("scope", endpoints(provider).scope),
        ],
    )
    .await
}

async fn refresh_tokens(
    http: &reqwest::Client,
    provider: EmailProvider,
    client: &OAuthClientConfig,
    refresh_token: &str,
) -> Result<ProviderTokens, AppError> {
    token_request(
        http,
        provider,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
        ],
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    /// Google userinfo
    email: Option<String>,
    /// Graph `/me`
    mail: Option<String>,
    user_principal_name: Option<String>,
}

impl Profile {
    fn address(self) -> Option<String> {
        self.email
            .or(self.mail)
            .or(self.user_principal_name)
            .filter(|address| !address.is_empty())
    }
}

async fn mailbox_address(
    http: &reqwest::Client,
    provider: EmailProvider,
    access_token: &str,
) -> Result<String, AppError> {
    let response = http
        .get(endpoints(provider).profile)
        .bearer_auth(access_token)
        .send()
        .await?
        .error_for_status()?;
    let profile: Profile = response.json().await?;
    profile
        .address()
        .ok_or_else(|| AppError::Upstream("mailbox profile has no address".to_string()))
}

/// Finish an OAuth flow: check the state, trade the code for tokens, look
/// up the mailbox address and store the connection.
pub async fn complete_connection(
    pool: &DbPool,
    http: &reqwest::Client,
    config: &Config,
    provider: EmailProvider,
    code: &str,
    state: &str,
) -> Result<EmailSettings, AppError> {
    let user_id = verify_state(config.state_secret(), provider, state)
        .ok_or_else(|| AppError::InvalidRequest("invalid_state".to_string()))?;
    let client = client_config(config, provider)?;

    let tokens = exchange_code(http, provider, &client, code).await?;
    let address = mailbox_address(http, provider, &tokens.access_token).await?;

    let settings = save_settings(pool, user_id, provider, &address, &tokens).await?;
    tracing::info!(%user_id, provider = provider.as_str(), "mailbox connected");
    Ok(settings)
}

async fn save_settings(
    pool: &DbPool,
    user_id: Uuid,
    provider: EmailProvider,
    address: &str,
    tokens: &ProviderTokens,
) -> Result<EmailSettings, AppError> {
    let expires_at = tokens
        .expires_in
        .map(|secs| Utc::now() + chrono::Duration::seconds(secs));

    let settings = sqlx::query_as::<_, EmailSettings>(
        r#"
        INSERT INTO email_settings (user_id, provider, email, access_token, refresh_token, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id) DO UPDATE SET
            provider = EXCLUDED.provider,
            email = EXCLUDED.email,
            access_token = EXCLUDED.access_token,
            refresh_token = CASE
                WHEN email_settings.provider = EXCLUDED.provider
                THEN COALESCE(EXCLUDED.refresh_token, email_settings.refresh_token)
                ELSE EXCLUDED.refresh_token
            END,
            expires_at = EXCLUDED.expires_at,
            connected_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(provider)
    .bind(address)
    .bind(&tokens.access_token)
    .bind(&tokens.refresh_token)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(settings)
}

async fn find_settings(pool: &DbPool, user_id: Uuid) -> Result<Option<EmailSettings>, AppError> {
    Ok(
        sqlx::query_as::<_, EmailSettings>("SELECT * FROM email_settings WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn status(pool: &DbPool, user_id: Uuid) -> Result<EmailStatusResponse, AppError> {
    Ok(match find_settings(pool, user_id).await? {
        Some(settings) => EmailStatusResponse {
            connected: true,
            provider: Some(settings.provider),
            email: Some(settings.email),
        },
        None => EmailStatusResponse {
            connected: false,
            provider: None,
            email: None,
        },
    })
}

pub async fn disconnect(pool: &DbPool, user_id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM email_settings WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() > 0 {
        tracing::info!(%user_id, "mailbox disconnected");
    }
    Ok(())
}

/// Plain-text body as HTML with the open-tracking pixel appended.
pub fn html_body(body: &str, tracking_url: &str) -> String {
    let html = body.replace("\r\n", "\n").replace('\n', "<br>");
    format!(
        r#"{html}<img src="{tracking_url}" width="1" height="1" style="display:none;" alt="" />"#
    )
}

fn header_value(value: &str) -> String {
    let flat = value.replace(['\r', '\n'], " ");
    if flat.is_ascii() {
        flat
    } else {
        format!("=?UTF-8?B?{}?=", BASE64_STANDARD.encode(flat.as_bytes()))
    }
}

/// RFC 2822 message, base64url encoded for the Gmail API `raw` field.
pub fn gmail_raw_message(to: &str, subject: &str, html: &str) -> String {
    let message = format!(
        "To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/html; charset=utf-8\r\n\r\n{}",
        header_value(to),
        header_value(subject),
        html
    );
    BASE64_URL_SAFE_NO_PAD.encode(message.as_bytes())
}

async fn deliver(
    http: &reqwest::Client,
    provider: EmailProvider,
    access_token: &str,
    to: &str,
    subject: &str,
    html: &str,
) -> Result<(), AppError> {
    let request = match provider {
        EmailProvider::Gmail => http
            .post(GMAIL_SEND_URL)
            .json(&serde_json::json!({ "raw": gmail_raw_message(to, subject, html) })),
        EmailProvider::Outlook => http.post(GRAPH_SEND_URL).json(&serde_json::json!({
            "message": {
                "subject": subject,
                "body": { "contentType": "HTML", "content": html },
                "toRecipients": [{ "emailAddress": { "address": to } }],
            },
            "saveToSentItems": true,
        })),
    };

    let response = request.bearer_auth(access_token).send().await?;
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(AppError::EmailAuthExpired);
    }
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(AppError::Upstream(format!(
            "{} send returned {status}: {detail}",
            provider.as_str()
        )));
    }
    Ok(())
}

/// Access token to send with, refreshing it first when it is about to expire.
async fn fresh_access_token(
    pool: &DbPool,
    http: &reqwest::Client,
    config: &Config,
    settings: &EmailSettings,
) -> Result<String, AppError> {
    if !settings.needs_refresh(Utc::now()) {
        return Ok(settings.access_token.clone());
    }
    let refresh_token = settings
        .refresh_token
        .as_deref()
        .ok_or(AppError::EmailAuthExpired)?;
    let client = client_config(config, settings.provider)?;

    let tokens = refresh_tokens(http, settings.provider, &client, refresh_token).await?;
    let refreshed = save_settings(pool, settings.user_id, settings.provider, &settings.email, &tokens).await?;
    tracing::debug!(user_id = %settings.user_id, "access token refreshed");
    Ok(refreshed.access_token)
}

async fn mark_failed(pool: &DbPool, log_id: Uuid, reason: &str) {
    let result = sqlx::query("UPDATE email_logs SET status = 'Failed', error_message = $2 WHERE id = $1")
        .bind(log_id)
        .bind(reason)
        .execute(pool)
        .await;
    if let Err(err) = result {
        tracing::warn!(%log_id, error = %err, "could not mark email as failed");
    }
}

/// Send one email from the user's connected mailbox. Returns the log id.
pub async fn send(
    pool: &DbPool,
    http: &reqwest::Client,
    config: &Config,
    user_id: Uuid,
    request: &SendEmailRequest,
) -> Result<Uuid, AppError> {
    let to = normalize_email(&request.to);
    if !is_valid_email(&to) {
        return Err(AppError::InvalidRequest(
            "A valid recipient email is required".to_string(),
        ));
    }
    if request.subject.trim().is_empty() {
        return Err(AppError::InvalidRequest("Subject is required".to_string()));
    }

    let settings = find_settings(pool, user_id)
        .await?
        .ok_or(AppError::EmailNotConnected)?;

    let log_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO email_logs (user_id, investor_id, recipient, subject, body, status, provider)
        VALUES (
            $1,
            (SELECT id FROM investors WHERE email = $2 ORDER BY created_at LIMIT 1),
            $2, $3, $4, 'Sent', $5
        )
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(&to)
    .bind(&request.subject)
    .bind(&request.body)
    .bind(settings.provider)
    .fetch_one(pool)
    .await?;

    let tracking_url = format!(
        "{}/email/track/{log_id}",
        config.api_base_url.trim_end_matches('/')
    );
    let html = html_body(&request.body, &tracking_url);

    let outcome = async {
        let access_token = fresh_access_token(pool, http, config, &settings).await?;
        deliver(http, settings.provider, &access_token, &to, &request.subject, &html).await
    }
    .await;

    match outcome {
        Ok(()) => {
            tracing::info!(%user_id, %log_id, provider = settings.provider.as_str(), "email sent");
            Ok(log_id)
        }
        Err(err) => {
            tracing::warn!(%user_id, %log_id, error = %err, "email delivery failed");
            mark_failed(pool, log_id, &err.to_string()).await;
            Err(err)
        }
    }
}

/// Record the first open of a tracked email. Unknown ids are ignored.
pub async fn track_open(pool: &DbPool, log_id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE email_logs SET status = 'Opened', opened_at = NOW() WHERE id = $1 AND opened_at IS NULL",
    )
    .bind(log_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// The user's sent emails, newest first.
pub async fn campaigns(pool: &DbPool, user_id: Uuid) -> Result<Vec<Campaign>, AppError> {
    let rows = sqlx::query_as::<_, Campaign>(
        r#"
        SELECT l.id, COALESCE(i.name, l.recipient) AS investor, l.recipient AS contact,
               l.subject, l.status, l.sent_at, l.opened_at
        FROM email_logs l
        LEFT JOIN investors i ON i.id = l.investor_id
        WHERE l.user_id = $1
        ORDER BY l.sent_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OAuthClientConfig {
        OAuthClientConfig {
            client_id: "client-123".to_string(),
            client_secret: "shh".to_string(),
            redirect_uri: "http://localhost:5001/api/auth/google/callback".to_string(),
        }
    }

    #[test]
    fn state_round_trips_only_for_its_provider() {
        let user_id = Uuid::new_v4();
        let state = sign_state("secret", EmailProvider::Gmail, user_id);

        assert_eq!(verify_state("secret", EmailProvider::Gmail, &state), Some(user_id));
        assert_eq!(verify_state("secret", EmailProvider::Outlook, &state), None);
        assert_eq!(verify_state("other", EmailProvider::Gmail, &state), None);
    }

    #[test]
    fn forged_state_is_rejected() {
        let state = sign_state("secret", EmailProvider::Gmail, Uuid::new_v4());
        let (_, signature) = state.split_once('.').unwrap();
        let forged = format!("{}.{signature}", Uuid::new_v4());

        assert_eq!(verify_state("secret", EmailProvider::Gmail, &forged), None);
        assert_eq!(verify_state("secret", EmailProvider::Gmail, "no-dot"), None);
    }

    #[test]
    fn google_url_requests_offline_access() {
        let url = authorization_url(EmailProvider::Gmail, &client(), "abc.def").unwrap();
        let parsed = url::Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert_eq!(parsed.host_str(), Some("accounts.google.com"));
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["state"], "abc.def");
        assert_eq!(params["access_type"], "offline");
        assert!(params["scope"].contains("gmail.send"));
    }

    #[test]
    fn outlook_url_asks_for_mail_send() {
        let url = authorization_url(EmailProvider::Outlook, &client(), "s").unwrap();
        assert!(url.starts_with("https://login.microsoftonline.com/common/oauth2/v2.0/authorize?"));
        assert!(url.contains("Mail.Send"));
        assert!(!url.contains("access_type"));
    }

    #[test]
    fn body_gets_breaks_and_pixel() {
        let html = html_body("Hi Sarah,\nQuick intro.", "http://api/email/track/1");
        assert!(html.starts_with("Hi Sarah,<br>Quick intro.<img src=\"http://api/email/track/1\""));
    }

    #[test]
    fn raw_message_decodes_to_headers_and_body() {
        let raw = gmail_raw_message("a@b.co", "Hello\r\nBcc: x@y.z", "<p>hi</p>");
        let decoded = String::from_utf8(BASE64_URL_SAFE_NO_PAD.decode(raw).unwrap()).unwrap();

        assert!(decoded.starts_with("To: a@b.co\r\nSubject: Hello  Bcc: x@y.z\r\n"));
        assert!(decoded.ends_with("\r\n\r\n<p>hi</p>"));
    }

    #[test]
    fn non_ascii_subjects_are_encoded() {
        assert_eq!(header_value("Plain"), "Plain");
        assert!(header_value("Café").starts_with("=?UTF-8?B?"));
    }

    #[test]
    fn pixel_is_a_gif() {
        assert!(TRACKING_PIXEL.starts_with(b"GIF89a"));
        assert_eq!(TRACKING_PIXEL.len(), 42);
    }

    #[test]
    fn profile_prefers_primary_address() {
        let graph: Profile =
            serde_json::from_str(r#"{"mail": null, "userPrincipalName": "f@contoso.com"}"#).unwrap();
        assert_eq!(graph.address().as_deref(), Some("f@contoso.com"));
    }
}
