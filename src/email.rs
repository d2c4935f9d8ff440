use crate::config::Config;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// A message ready to hand to the delivery API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

/// Client for the transactional email API.
#[derive(Debug, Clone)]
pub struct EmailClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl EmailClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.email_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            api_url: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
            from: config.email_from.clone(),
        })
    }

    /// Send one email. Non-2xx answers are errors carrying status and body.
    pub async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let request = SendEmailRequest {
            from: &self.from,
            to: vec![email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
            reply_to: email.reply_to.as_deref(),
        };

        let response = self
            .http
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .context("Failed to send request to email API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Email API error ({}): {}", status, body);
        }

        let id = response
            .json::<SendEmailResponse>()
            .await
            .ok()
            .and_then(|r| r.id)
            .unwrap_or_else(|| "unknown".to_string());

        info!("Email '{}' accepted for {} (id: {})", email.subject, email.to, id);
        Ok(())
    }
}
