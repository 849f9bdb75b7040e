// Authentication module
// Manages the access token lifecycle for Selling Partner API calls

mod exchange;
mod manager;
mod types;

pub use exchange::TOKEN_URL;
pub use manager::{TokenManager, ACCESS_TOKEN_HEADER, DEFAULT_EXPIRY_MARGIN_SECS};
pub use types::{AccessTokenResponse, CredentialField, Credentials, TokenRequest};
