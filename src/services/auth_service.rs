//! Domain service for the shared household password.

use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid password")]
    InvalidCredentials,

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Checks a login attempt against the configured password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the password does not match.
    async fn verify_password(&self, password: &str) -> Result<(), AuthError>;
}
