use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::auth::{Credentials, TOKEN_URL};

/// Selling Partner API token tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// LWA client identifier
    #[arg(long, env = "SP_CLIENT_ID")]
    pub client_id: Option<String>,

    /// LWA client secret
    #[arg(long, env = "SP_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// LWA refresh token
    #[arg(long, env = "SP_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// Token endpoint
    #[arg(long, env = "SP_TOKEN_URL", default_value = TOKEN_URL)]
    pub token_url: String,

    /// Seconds before expiry at which a token counts as stale
    #[arg(long, env = "TOKEN_EXPIRY_MARGIN", default_value = "60")]
    pub expiry_margin: i64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub http_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Refresh the access token and report its expiry
    Refresh,

    /// Exchange an authorization code and print the issued refresh token
    Exchange {
        /// Authorization code from the consent redirect
        #[arg(long)]
        code: String,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub credentials: Credentials,
    pub token_url: String,
    pub expiry_margin_secs: i64,
    pub http_request_timeout: u64,
    pub log_level: String,
    pub command: Command,
}

impl Config {
    /// Load configuration with priority: CLI > ENV > .env > defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Ok(Self::from_args(CliArgs::parse()))
    }

    pub fn from_args(args: CliArgs) -> Self {
        // Missing values stay empty so that credential validation names the field
        let credentials = Credentials::new(
            args.client_id.unwrap_or_default(),
            args.client_secret.unwrap_or_default(),
            args.refresh_token.unwrap_or_default(),
        );

        Config {
            credentials,
            token_url: args.token_url,
            expiry_margin_secs: args.expiry_margin,
            http_request_timeout: args.http_timeout,
            log_level: args.log_level,
            command: args.command,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.http_request_timeout == 0 {
            anyhow::bail!("HTTP_REQUEST_TIMEOUT must be greater than zero");
        }

        if self.expiry_margin_secs < 0 {
            anyhow::bail!("TOKEN_EXPIRY_MARGIN must not be negative");
        }

        self.credentials
            .validate()
            .context("Incomplete Selling Partner credentials")?;

        Ok(())
    }
}
