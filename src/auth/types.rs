// Authentication types

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::CredentialError;

/// Credential field names, in validation priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    RefreshToken,
    ClientId,
    ClientSecret,
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CredentialField::RefreshToken => "refresh token",
            CredentialField::ClientId => "client id",
            CredentialField::ClientSecret => "client secret",
        };
        f.write_str(name)
    }
}

/// Selling Partner API application credentials
///
/// Immutable once built; the token manager only ever reads them.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Check that every field is present.
    /// Reports the first missing field: refresh token, then client id, then client secret.
    pub fn validate(&self) -> Result<(), CredentialError> {
        let fields = [
            (CredentialField::RefreshToken, &self.refresh_token),
            (CredentialField::ClientId, &self.client_id),
            (CredentialField::ClientSecret, &self.client_secret),
        ];

        match fields.iter().find(|(_, value)| value.is_empty()) {
            Some((field, _)) => Err(CredentialError::MissingField(*field)),
            None => Ok(()),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }
}

// Secrets stay out of logs and panic messages
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Token endpoint request body, tagged by OAuth2 grant type
#[derive(Debug, Serialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum TokenRequest<'a> {
    RefreshToken {
        refresh_token: &'a str,
        client_id: &'a str,
        client_secret: &'a str,
    },
    AuthorizationCode {
        code: &'a str,
        client_id: &'a str,
        client_secret: &'a str,
    },
}

impl TokenRequest<'_> {
    pub fn grant_type(&self) -> &'static str {
        match self {
            TokenRequest::RefreshToken { .. } => "refresh_token",
            TokenRequest::AuthorizationCode { .. } => "authorization_code",
        }
    }
}

/// Token endpoint response body
///
/// Every field is optional on the wire; missing or `null` values read as empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AccessTokenResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub access_token: String,
    #[serde(deserialize_with = "null_as_default")]
    pub refresh_token: String,
    #[serde(deserialize_with = "null_as_default")]
    pub token_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub expires_in: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub error: String,
    #[serde(deserialize_with = "null_as_default")]
    pub error_description: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
