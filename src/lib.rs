// Selling Partner auth - library root

pub mod auth;
pub mod config;
pub mod error;

pub use auth::{Credentials, TokenManager};
pub use error::{AuthError, CredentialError};
