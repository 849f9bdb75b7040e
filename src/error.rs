// Error handling module
// Defines credential and token lifecycle error types

use reqwest::header::InvalidHeaderValue;
use thiserror::Error;

use crate::auth::CredentialField;

/// Credential validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// A required credential field is empty
    #[error("{0} is required")]
    MissingField(CredentialField),
}

/// Errors that can occur while obtaining or attaching an access token
#[derive(Error, Debug)]
pub enum AuthError {
    /// Token manager was built from incomplete credentials
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[source] CredentialError),

    /// A refresh was requested without a refresh token
    #[error("Refresh token is needed")]
    RefreshTokenNeeded,

    /// The token endpoint could not be reached or its body could not be read
    #[error("Token endpoint transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token endpoint replied with something that is not a token response
    #[error("Token response parse failed: {source}")]
    MalformedResponse {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// The provider answered with an explicit OAuth2 error code
    #[error("Token request rejected with code {code}, description {description}")]
    ProviderRejected { code: String, description: String },

    /// The response carried neither a token nor an error
    #[error("Token request failed with unknown reason. Body: {body}")]
    UnknownFailure { body: String },

    /// Authorization code exchange failed
    #[error("Authorization code exchange failed: {0}")]
    CodeExchange(#[source] Box<AuthError>),

    /// A request could not be authorized because the token refresh failed
    #[error("Cannot authorize request: {0}")]
    AuthorizationFailed(#[source] Box<AuthError>),

    /// The cached token is not a valid header value
    #[error("Access token is not a valid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

impl AuthError {
    /// The innermost error, with `CodeExchange` and `AuthorizationFailed` wrappers removed
    pub fn root_cause(&self) -> &AuthError {
        match self {
            AuthError::CodeExchange(inner) | AuthError::AuthorizationFailed(inner) => {
                inner.root_cause()
            }
            other => other,
        }
    }
}

/// Result type alias for token operations
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AuthError::InvalidConfig(CredentialError::MissingField(
            CredentialField::RefreshToken,
        ));
        assert_eq!(
            err.to_string(),
            "Invalid configuration: refresh token is required"
        );

        let err = AuthError::ProviderRejected {
            code: "invalid_grant".to_string(),
            description: "bad token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Token request rejected with code invalid_grant, description bad token"
        );

        let err = AuthError::UnknownFailure {
            body: "{}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Token request failed with unknown reason. Body: {}"
        );
    }

    #[test]
    fn test_wrapped_messages_distinguish_operation() {
        let err = AuthError::CodeExchange(Box::new(AuthError::UnknownFailure {
            body: "{}".to_string(),
        }));
        assert!(err
            .to_string()
            .starts_with("Authorization code exchange failed: "));

        let err = AuthError::AuthorizationFailed(Box::new(AuthError::RefreshTokenNeeded));
        assert_eq!(
            err.to_string(),
            "Cannot authorize request: Refresh token is needed"
        );
    }

    #[test]
    fn test_root_cause_peels_wrappers() {
        let err = AuthError::AuthorizationFailed(Box::new(AuthError::CodeExchange(Box::new(
            AuthError::RefreshTokenNeeded,
        ))));
        assert!(matches!(err.root_cause(), AuthError::RefreshTokenNeeded));

        let err = AuthError::RefreshTokenNeeded;
        assert!(matches!(err.root_cause(), AuthError::RefreshTokenNeeded));
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error as _;

        let err = AuthError::AuthorizationFailed(Box::new(AuthError::ProviderRejected {
            code: "invalid_client".to_string(),
            description: String::new(),
        }));
        let source = err.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(source.contains("invalid_client"));
    }
}
