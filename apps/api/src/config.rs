use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub store_path: String,
    pub google_credentials_path: String,
    /// Collaborator every provisioned spreadsheet is shared with.
    pub sheet_share_email: String,
    /// Workspace user impersonated through domain-wide delegation.
    /// When unset, spreadsheets are only created under the service account.
    pub google_delegated_user: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            store_path: std::env::var("STORE_PATH").unwrap_or_else(|_| "db.json".to_string()),
            google_credentials_path: std::env::var("GOOGLE_CREDENTIALS_PATH")
                .unwrap_or_else(|_| "credentials.json".to_string()),
            sheet_share_email: require_env("SHEET_SHARE_EMAIL")?,
            google_delegated_user: optional_env("GOOGLE_DELEGATED_USER"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
