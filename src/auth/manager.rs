use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Request};
use tracing::Dispatch;

use super::exchange::{self, emit, TOKEN_URL};
use super::types::{Credentials, TokenRequest};
use crate::error::{AuthError, Result};

/// Header carrying the access token on Selling Partner API calls
pub const ACCESS_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-amz-access-token");

/// How much earlier than its declared expiry a token is treated as stale.
/// Absorbs clock skew between this host and the token issuer.
pub const DEFAULT_EXPIRY_MARGIN_SECS: i64 = 60;

/// Token manager
/// Caches one access token and refreshes it lazily before requests.
///
/// Mutating operations take `&mut self`; callers sharing a manager across
/// tasks must serialize access themselves (e.g. `tokio::sync::Mutex`).
pub struct TokenManager {
    /// Application credentials
    credentials: Credentials,

    /// Cached access token
    access_token: Option<String>,

    /// Cached token expiration time
    expires_at: Option<DateTime<Utc>>,

    /// HTTP client for token requests
    client: Client,

    /// Token endpoint
    token_url: String,

    /// Safety margin subtracted from the expiry
    expiry_margin: Duration,

    /// Diagnostics sink; the global subscriber when unset
    dispatch: Option<Dispatch>,
}

impl TokenManager {
    /// Create a manager with no cached token
    pub fn new(credentials: Credentials) -> Result<Self> {
        credentials.validate().map_err(AuthError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            credentials,
            access_token: None,
            expires_at: None,
            client,
            token_url: TOKEN_URL.to_string(),
            expiry_margin: Duration::seconds(DEFAULT_EXPIRY_MARGIN_SECS),
            dispatch: None,
        })
    }

    /// Use the given HTTP client for token requests
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_expiry_margin(mut self, margin: Duration) -> Self {
        self.expiry_margin = margin;
        self
    }

    /// Route this manager's diagnostics to `dispatch` instead of the global subscriber.
    /// `Dispatch::none()` silences them.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Check if the cached token must be refreshed before use
    pub fn is_token_stale(&self) -> bool {
        if self.access_token().is_none() {
            return true;
        }

        match self.expires_at {
            None => true,
            Some(exp) => exp
                .checked_sub_signed(self.expiry_margin)
                .map_or(true, |refresh_at| refresh_at <= Utc::now()),
        }
    }

    /// Refresh the access token with the configured refresh token.
    /// On failure the previously cached token, stale or not, is kept.
    pub async fn refresh(&mut self) -> Result<()> {
        let refresh_token = self.credentials.refresh_token();
        if refresh_token.is_empty() {
            return Err(AuthError::RefreshTokenNeeded);
        }

        let request = TokenRequest::RefreshToken {
            refresh_token,
            client_id: self.credentials.client_id(),
            client_secret: self.credentials.client_secret(),
        };

        let token_data = exchange::exchange(
            &self.client,
            &self.token_url,
            &request,
            self.dispatch.as_ref(),
        )
        .await?;

        self.access_token = Some(token_data.access_token);
        self.expires_at = Some(token_data.expires_at);

        Ok(())
    }

    /// Exchange an authorization code for an access token.
    /// Returns the refresh token issued alongside it, if any, for the caller to keep.
    pub async fn exchange_authorization_code(&mut self, code: &str) -> Result<Option<String>> {
        let request = TokenRequest::AuthorizationCode {
            code,
            client_id: self.credentials.client_id(),
            client_secret: self.credentials.client_secret(),
        };

        let token_data = exchange::exchange(
            &self.client,
            &self.token_url,
            &request,
            self.dispatch.as_ref(),
        )
        .await
        .map_err(|e| AuthError::CodeExchange(Box::new(e)))?;

        self.access_token = Some(token_data.access_token);
        self.expires_at = Some(token_data.expires_at);

        Ok(token_data.refresh_token)
    }

    /// Attach a valid access token to `request`, refreshing first if the cached one is stale.
    /// The request is left untouched on failure.
    pub async fn authorize_request(&mut self, request: &mut Request) -> Result<()> {
        self.authorize_headers(request.headers_mut()).await
    }

    /// Same as [`authorize_request`](Self::authorize_request), on a bare header map
    pub async fn authorize_headers(&mut self, headers: &mut HeaderMap) -> Result<()> {
        let value = self
            .current_header_value()
            .await
            .map_err(|e| AuthError::AuthorizationFailed(Box::new(e)))?;

        headers.insert(ACCESS_TOKEN_HEADER, value);
        Ok(())
    }

    async fn current_header_value(&mut self) -> Result<HeaderValue> {
        if self.is_token_stale() {
            emit(self.dispatch.as_ref(), || {
                tracing::debug!(expires_at = ?self.expires_at, "Access token stale, refreshing");
            });
            self.refresh().await?;
        }

        let token = self.access_token().unwrap_or_default();
        let mut value = HeaderValue::from_str(token)?;
        value.set_sensitive(true);
        Ok(value)
    }
}
