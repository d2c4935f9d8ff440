use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,

    // Email delivery API
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
    pub email_timeout_secs: u64,

    // Internal address receiving form notifications
    pub notification_email: String,

    // Language preference
    pub language_preference_path: String,
    pub language_transition_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            // Email delivery API
            email_api_url: std::env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
            email_api_key: std::env::var("EMAIL_API_KEY").context("EMAIL_API_KEY not set")?,
            email_from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Crédit & Conseil <contact@credit-conseil.example>".to_string()),
            email_timeout_secs: std::env::var("EMAIL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),

            notification_email: std::env::var("NOTIFICATION_EMAIL")
                .context("NOTIFICATION_EMAIL not set")?,

            // Language preference
            language_preference_path: std::env::var("LANGUAGE_PREFERENCE_PATH")
                .unwrap_or_else(|_| "data/language.json".to_string()),
            language_transition_ms: std::env::var("LANGUAGE_TRANSITION_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        })
    }
}
