use anyhow::{Context, Result};
use chrono::Duration;

use sp_auth::config::{Command, Config};
use sp_auth::TokenManager;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    // Initialize logging with the configured level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    config.validate()?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.http_request_timeout))
        .build()
        .context("Failed to create HTTP client")?;

    let mut manager = TokenManager::new(config.credentials.clone())?
        .with_client(client)
        .with_token_url(&config.token_url)
        .with_expiry_margin(Duration::seconds(config.expiry_margin_secs));

    match config.command {
        Command::Refresh => {
            manager
                .refresh()
                .await
                .context("Failed to refresh access token")?;
        }
        Command::Exchange { ref code } => {
            let issued = manager
                .exchange_authorization_code(code)
                .await
                .context("Failed to exchange authorization code")?;

            match issued {
                Some(refresh_token) => println!("refresh_token={}", refresh_token),
                None => tracing::warn!("Provider did not issue a refresh token"),
            }
        }
    }

    tracing::info!("✅ {}", token_status(&manager));

    Ok(())
}

/// Operator-facing summary of the cached token; never includes the token itself
fn token_status(manager: &TokenManager) -> String {
    match (manager.access_token(), manager.expires_at()) {
        (Some(_), Some(exp)) => format!("Access token valid until {}", exp.to_rfc3339()),
        _ => "No access token cached".to_string(),
    }
}
