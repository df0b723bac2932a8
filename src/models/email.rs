//! Mailbox connection, outbound email log and campaign models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "email_provider", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    Gmail,
    Outlook,
}

impl EmailProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            EmailProvider::Gmail => "gmail",
            EmailProvider::Outlook => "outlook",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "email_status")]
pub enum EmailStatus {
    Sent,
    Opened,
    Replied,
    Bounced,
    Failed,
}

/// Stored OAuth credentials for a user's mailbox.
///
/// # Database Table
///
/// Maps to `email_settings`, one row per user. Tokens never leave the server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmailSettings {
    pub user_id: Uuid,
    pub provider: EmailProvider,
    pub email: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub connected_at: DateTime<Utc>,
}

impl EmailSettings {
    /// Treat tokens within a minute of expiry as expired.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now + chrono::Duration::seconds(60),
            None => false,
        }
    }
}

/// Fresh tokens from a provider's token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// One row of the campaigns table on the founder CRM page.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    /// Linked investor's name, or the recipient address
    pub investor: String,
    pub contact: String,
    pub subject: String,
    pub status: EmailStatus,
    pub sent_at: DateTime<Utc>,
    pub opened_at: Option<DateTime<Utc>>,
}

/// Request body for `POST /api/email/send`.
#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub to: String,
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Response body for `POST /api/email/send`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: &'static str,
    pub log_id: Uuid,
}

/// Response body for `GET /api/email/status`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct EmailStatusResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<EmailProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Response body for the OAuth initiation endpoints.
#[derive(Debug, Serialize)]
pub struct AuthUrlResponse {
    pub url: String,
}

/// Query string the provider sends back to the callback.
#[derive(Debug, Default, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(expires_at: Option<DateTime<Utc>>) -> EmailSettings {
        EmailSettings {
            user_id: Uuid::new_v4(),
            provider: EmailProvider::Gmail,
            email: "founder@example.com".to_string(),
            access_token: "at".to_string(),
            refresh_token: Some("rt".to_string()),
            expires_at,
            connected_at: Utc::now(),
        }
    }

    #[test]
    fn refresh_window() {
        let now = Utc::now();
        assert!(settings(Some(now - chrono::Duration::minutes(5))).needs_refresh(now));
        assert!(settings(Some(now + chrono::Duration::seconds(30))).needs_refresh(now));
        assert!(!settings(Some(now + chrono::Duration::hours(1))).needs_refresh(now));
        assert!(!settings(None).needs_refresh(now));
    }

    #[test]
    fn disconnected_status_omits_details() {
        let body = serde_json::to_value(EmailStatusResponse {
            connected: false,
            provider: None,
            email: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "connected": false }));
    }

    #[test]
    fn email_status_keeps_capitalised_names() {
        assert_eq!(serde_json::to_value(EmailStatus::Opened).unwrap(), "Opened");
    }
}
