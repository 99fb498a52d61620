//! Argon2 implementation of the `AuthService` trait.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use tokio::task;
use tracing::warn;

use crate::config::{AuthConfig, SecurityConfig};
use crate::services::auth_service::{AuthError, AuthService};

/// Verifies login attempts against a single PHC hash held in memory.
pub struct Argon2AuthService {
    password_hash: String,
}

impl Argon2AuthService {
    /// Builds the service from the auth section.
    ///
    /// A configured hash wins. A plain password is hashed once here so the
    /// cleartext never outlives startup.
    ///
    /// # Errors
    ///
    /// Fails when neither credential is set or the hash is not a PHC string.
    pub fn from_config(auth: &AuthConfig, security: &SecurityConfig) -> Result<Self> {
        if let Some(hash) = auth.password_hash.as_deref().filter(|h| !h.is_empty()) {
            PasswordHash::new(hash)
                .map_err(|e| anyhow::anyhow!("Invalid auth.password_hash: {e}"))?;
            return Ok(Self {
                password_hash: hash.to_string(),
            });
        }

        let password = auth
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .context("No household password configured")?;

        warn!("Using a plaintext password from the environment; prefer AUTH_PASSWORD_HASH");
        Ok(Self {
            password_hash: hash_password(password, security)?,
        })
    }
}

#[async_trait]
impl AuthService for Argon2AuthService {
    async fn verify_password(&self, password: &str) -> Result<(), AuthError> {
        let password_hash = self.password_hash.clone();
        let password = password.to_string();

        // Argon2 is CPU bound
        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        if is_valid {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Hashes `password` into an Argon2id PHC string with the configured cost.
///
/// # Errors
///
/// Returns an error for out-of-range cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        }
    }

    #[tokio::test]
    async fn test_plain_password_is_hashed_and_verified() {
        let auth = AuthConfig {
            password: Some("hunter22".to_string()),
            ..AuthConfig::default()
        };
        let service = Argon2AuthService::from_config(&auth, &cheap()).unwrap();

        assert!(service.password_hash.starts_with("$argon2id$"));
        assert!(service.verify_password("hunter22").await.is_ok());
        assert!(matches!(
            service.verify_password("hunter2").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_configured_hash_takes_precedence() {
        let hash = hash_password("from-hash", &cheap()).unwrap();
        let auth = AuthConfig {
            password_hash: Some(hash),
            password: Some("from-env".to_string()),
            ..AuthConfig::default()
        };
        let service = Argon2AuthService::from_config(&auth, &cheap()).unwrap();

        assert!(service.verify_password("from-hash").await.is_ok());
        assert!(service.verify_password("from-env").await.is_err());
    }

    #[test]
    fn test_missing_or_malformed_credentials_fail() {
        assert!(Argon2AuthService::from_config(&AuthConfig::default(), &cheap()).is_err());

        let auth = AuthConfig {
            password_hash: Some("not-a-phc-string".to_string()),
            ..AuthConfig::default()
        };
        assert!(Argon2AuthService::from_config(&auth, &cheap()).is_err());
    }
}
