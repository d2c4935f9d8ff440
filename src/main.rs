use anyhow::{Context, Result};
use finsite::config::Config;
use finsite::email::EmailClient;
use finsite::i18n::{FilePreferenceStore, LanguageSession};
use finsite::loan::RatePolicy;
use finsite::server::{build_router, AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("finsite=info".parse()?),
        )
        .init();

    info!("Starting finsite server");

    // Load configuration from environment
    let config = Config::from_env()?;

    let store = Arc::new(FilePreferenceStore::new(&config.language_preference_path));
    let session = LanguageSession::new(store)
        .with_transition_delay(Duration::from_millis(config.language_transition_ms));
    let email = EmailClient::new(&config)?;

    let addr = format!("0.0.0.0:{}", config.port);
    let state = AppState {
        config: Arc::new(config),
        email: Arc::new(email),
        session: Arc::new(session),
        policy: Arc::new(RatePolicy::standard()),
    };

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, build_router(state))
        .await
        .context("Server error")?;

    Ok(())
}
