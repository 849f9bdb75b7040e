// Token endpoint exchange

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tracing::Dispatch;

use super::types::{AccessTokenResponse, TokenRequest};
use crate::error::{AuthError, Result};

/// Login with Amazon token endpoint
pub const TOKEN_URL: &str = "https://api.amazon.com/auth/o2/token";

/// Token data from a successful exchange
#[derive(Debug, Clone)]
pub struct TokenData {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Run `f` against the injected dispatcher, or the global one when none is set
pub(crate) fn emit<T>(dispatch: Option<&Dispatch>, f: impl FnOnce() -> T) -> T {
    match dispatch {
        Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
        None => f(),
    }
}

/// POST a token request and classify the reply.
/// The HTTP status is not inspected: the provider reports errors in the JSON body.
pub async fn exchange(
    client: &Client,
    url: &str,
    request: &TokenRequest<'_>,
    dispatch: Option<&Dispatch>,
) -> Result<TokenData> {
    let grant_type = request.grant_type();
    emit(dispatch, || {
        tracing::debug!(url = %url, grant_type, "Sending token request");
    });

    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(request)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    let received_at = Utc::now();

    let data: AccessTokenResponse = match serde_json::from_str(&body) {
        Ok(data) => data,
        Err(source) => {
            emit(dispatch, || {
                tracing::error!(
                    grant_type,
                    status = %status,
                    body = %body,
                    "Token response parse failed"
                );
            });
            return Err(AuthError::MalformedResponse { body, source });
        }
    };

    parse_token_data(data, body, received_at, grant_type, dispatch)
}

fn parse_token_data(
    data: AccessTokenResponse,
    body: String,
    received_at: DateTime<Utc>,
    grant_type: &str,
    dispatch: Option<&Dispatch>,
) -> Result<TokenData> {
    // A token wins even when an error field is present too
    if !data.access_token.is_empty() {
        let expires_at = expiry_from(received_at, data.expires_in);
        emit(dispatch, || {
            tracing::info!(
                grant_type,
                expires_at = %expires_at.to_rfc3339(),
                "Access token obtained"
            );
        });

        return Ok(TokenData {
            access_token: data.access_token,
            refresh_token: Some(data.refresh_token).filter(|t| !t.is_empty()),
            expires_at,
        });
    }

    if !data.error.is_empty() {
        emit(dispatch, || {
            tracing::error!(
                grant_type,
                error = %data.error,
                error_description = %data.error_description,
                "Token request rejected by provider"
            );
        });
        return Err(AuthError::ProviderRejected {
            code: data.error,
            description: data.error_description,
        });
    }

    emit(dispatch, || {
        tracing::error!(grant_type, body = %body, "Token request failed with unknown reason");
    });
    Err(AuthError::UnknownFailure { body })
}

/// Absolute expiry for a relative lifetime.
/// Out-of-range lifetimes collapse to `received_at`, which reads as already stale.
fn expiry_from(received_at: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    Duration::try_seconds(expires_in)
        .and_then(|ttl| received_at.checked_add_signed(ttl))
        .unwrap_or(received_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> (AccessTokenResponse, String) {
        (serde_json::from_str(json).unwrap(), json.to_string())
    }

    #[test]
    fn test_token_takes_priority_over_error() {
        let now = Utc::now();
        let (data, body) =
            response(r#"{"access_token":"abc","expires_in":3600,"error":"invalid_grant"}"#);

        let token = parse_token_data(data, body, now, "refresh_token", None).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_at, now + Duration::seconds(3600));
        assert!(token.refresh_token.is_none());
    }

    #[test]
    fn test_issued_refresh_token_is_kept() {
        let (data, body) = response(
            r#"{"access_token":"abc","refresh_token":"atzr|new","expires_in":3600}"#,
        );
        let token = parse_token_data(data, body, Utc::now(), "authorization_code", None).unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("atzr|new"));
    }

    #[test]
    fn test_error_field_is_provider_rejection() {
        let (data, body) =
            response(r#"{"error":"invalid_grant","error_description":"bad token"}"#);

        match parse_token_data(data, body, Utc::now(), "refresh_token", None) {
            Err(AuthError::ProviderRejected { code, description }) => {
                assert_eq!(code, "invalid_grant");
                assert_eq!(description, "bad token");
            }
            other => panic!("expected ProviderRejected, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_object_is_unknown_failure() {
        let (data, body) = response("{}");
        match parse_token_data(data, body, Utc::now(), "refresh_token", None) {
            Err(AuthError::UnknownFailure { body }) => assert_eq!(body, "{}"),
            other => panic!("expected UnknownFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_null_fields_do_not_hide_token() {
        let now = Utc::now();
        let (data, body) =
            response(r#"{"access_token":"abc","refresh_token":null,"expires_in":3600}"#);

        let token = parse_token_data(data, body, now, "refresh_token", None).unwrap();
        assert_eq!(token.access_token, "abc");
        assert!(token.refresh_token.is_none());
        assert_eq!(token.expires_at, now + Duration::seconds(3600));
    }

    #[test]
    fn test_null_token_with_error_is_provider_rejection() {
        let (data, body) = response(
            r#"{"access_token":null,"error":"invalid_grant","error_description":"bad token"}"#,
        );

        match parse_token_data(data, body, Utc::now(), "refresh_token", None) {
            Err(AuthError::ProviderRejected { code, .. }) => assert_eq!(code, "invalid_grant"),
            other => panic!("expected ProviderRejected, got {:?}", other),
        }
    }

    #[test]
    fn test_expiry_from_out_of_range_lifetime() {
        let now = Utc::now();
        assert_eq!(expiry_from(now, 0), now);
        assert_eq!(expiry_from(now, 60), now + Duration::seconds(60));
        assert_eq!(expiry_from(now, i64::MAX), now);
    }
}
