//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.
//!
//! Optional integrations (Razorpay, Gmail, Outlook) are switched on by the presence of their
//! credentials. Handlers ask for them through the accessor methods and get a
//! `NotConfigured` error when they are missing.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 5001
/// - `FRONTEND_URL` (optional): where OAuth callbacks redirect the browser back to
/// - `API_BASE_URL` (optional): public base of this API, used in email tracking pixels
/// - `SESSION_TTL_DAYS` (optional): bearer session lifetime, defaults to 30
/// - `MAX_UPLOAD_BYTES` (optional): spreadsheet upload limit, defaults to 10 MiB
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i64,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Key used to sign OAuth `state` values. A random key is generated at
    /// startup when unset, which invalidates in-flight OAuth flows on restart.
    pub oauth_state_secret: Option<String>,

    pub razorpay_key_id: Option<String>,
    pub razorpay_key_secret: Option<String>,

    pub gmail_client_id: Option<String>,
    pub gmail_client_secret: Option<String>,
    pub gmail_redirect_uri: Option<String>,

    pub outlook_client_id: Option<String>,
    pub outlook_client_secret: Option<String>,
    pub outlook_redirect_uri: Option<String>,

    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
    pub bootstrap_admin_name: Option<String>,
}

/// Razorpay API credentials.
#[derive(Debug, Clone)]
pub struct RazorpayCredentials {
    pub key_id: String,
    pub key_secret: String,
}

/// OAuth client registration for one mail provider.
#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Administrator created or promoted at startup.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    5001
}

fn default_max_connections() -> u32 {
    5
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_api_base_url() -> String {
    "http://localhost:5001/api".to_string()
}

fn default_session_ttl_days() -> i64 {
    30
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        let mut config = envy::from_env::<Config>()?;

        if config.oauth_state_secret.is_none() {
            tracing::warn!("OAUTH_STATE_SECRET not set, using a per-process random key");
            config.oauth_state_secret = Some(hex::encode(rand::random::<[u8; 32]>()));
        }

        Ok(config)
    }

    pub fn razorpay(&self) -> Option<RazorpayCredentials> {
        Some(RazorpayCredentials {
            key_id: non_empty(&self.razorpay_key_id)?,
            key_secret: non_empty(&self.razorpay_key_secret)?,
        })
    }

    pub fn gmail(&self) -> Option<OAuthClientConfig> {
        Some(OAuthClientConfig {
            client_id: non_empty(&self.gmail_client_id)?,
            client_secret: non_empty(&self.gmail_client_secret)?,
            redirect_uri: non_empty(&self.gmail_redirect_uri)?,
        })
    }

    pub fn outlook(&self) -> Option<OAuthClientConfig> {
        Some(OAuthClientConfig {
            client_id: non_empty(&self.outlook_client_id)?,
            client_secret: non_empty(&self.outlook_client_secret)?,
            redirect_uri: non_empty(&self.outlook_redirect_uri)?,
        })
    }

    pub fn bootstrap_admin(&self) -> Option<BootstrapAdmin> {
        Some(BootstrapAdmin {
            email: non_empty(&self.bootstrap_admin_email)?,
            password: non_empty(&self.bootstrap_admin_password)?,
            name: non_empty(&self.bootstrap_admin_name).unwrap_or_else(|| "Admin".to_string()),
        })
    }

    pub fn state_secret(&self) -> &str {
        self.oauth_state_secret.as_deref().unwrap_or_default()
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
impl Config {
    /// Configuration with every optional integration switched off.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/fundraising_crm_test".to_string(),
            server_port: default_port(),
            database_max_connections: 1,
            frontend_url: default_frontend_url(),
            api_base_url: default_api_base_url(),
            session_ttl_days: default_session_ttl_days(),
            max_upload_bytes: default_max_upload_bytes(),
            oauth_state_secret: Some("test-state-secret".to_string()),
            razorpay_key_id: None,
            razorpay_key_secret: None,
            gmail_client_id: None,
            gmail_client_secret: None,
            gmail_redirect_uri: None,
            outlook_client_id: None,
            outlook_client_secret: None,
            outlook_redirect_uri: None,
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
            bootstrap_admin_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_disable_integrations() {
        let mut config = Config::for_tests();
        config.razorpay_key_id = Some("rzp_test".to_string());
        config.razorpay_key_secret = Some("   ".to_string());
        assert!(config.razorpay().is_none());

        config.razorpay_key_secret = Some("secret".to_string());
        let creds = config.razorpay().expect("both keys set");
        assert_eq!(creds.key_id, "rzp_test");
    }

    #[test]
    fn bootstrap_admin_defaults_name() {
        let mut config = Config::for_tests();
        config.bootstrap_admin_email = Some("ops@example.com".to_string());
        config.bootstrap_admin_password = Some("hunter22".to_string());

        let admin = config.bootstrap_admin().expect("email and password set");
        assert_eq!(admin.name, "Admin");
    }
}
