use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::session::MIN_SECRET_LEN;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub auth: AuthConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,

    /// Rows per page on the manage and finished listings
    pub page_size: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/showtracker.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
            page_size: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    /// Where browsers are sent when their session is missing or expired.
    pub login_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            secure_cookies: true,
            login_path: "/login".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Argon2 PHC string for the shared household password.
    /// Generate one with `showtracker hash-password <password>`.
    pub password_hash: Option<String>,

    /// Plain shared password. Hashed once at start-up when no
    /// `password_hash` is configured.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Key material for signing the session cookie (at least 64 bytes).
    /// A random key is generated when unset, which logs everybody out on restart.
    #[serde(skip_serializing)]
    pub session_secret: Option<String>,

    pub session_max_age_hours: i64,

    pub cookie_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password_hash: None,
            password: None,
            session_secret: None,
            session_max_age_hours: 4,
            cookie_name: "showtracker_session".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub json_logs: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "showtracker".to_string());

        Self {
            metrics_enabled: true,
            json_logs: false,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    /// Loads `.env`, the first config file found, then applies environment overrides.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from: {}", path.display());
        }

        let mut config = Self::load_file()?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Environment variables win over the config file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.general.database_path = url;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.general.log_level = level;
        }
        if let Some(size) = lookup("PAGE_SIZE") {
            self.general.page_size = size
                .parse()
                .with_context(|| format!("PAGE_SIZE is not a number: {size}"))?;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port: {port}"))?;
        }
        if let Some(password) = lookup("AUTH_PASSWORD") {
            self.auth.password = Some(password);
        }
        if let Some(hash) = lookup("AUTH_PASSWORD_HASH") {
            self.auth.password_hash = Some(hash);
        }
        if let Some(secret) = lookup("SESSION_SECRET") {
            self.auth.session_secret = Some(secret);
        }
        Ok(())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("showtracker").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".showtracker").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.password_hash.is_none()
            && self.auth.password.as_deref().is_none_or(str::is_empty)
        {
            anyhow::bail!(
                "No shared password configured: set auth.password_hash or AUTH_PASSWORD"
            );
        }

        if let Some(secret) = &self.auth.session_secret
            && secret.len() < MIN_SECRET_LEN
        {
            anyhow::bail!("Session secret must be at least {MIN_SECRET_LEN} bytes long");
        }

        if self.auth.session_max_age_hours <= 0 {
            anyhow::bail!("auth.session_max_age_hours must be > 0");
        }

        if self.general.page_size == 0 {
            anyhow::bail!("general.page_size must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.page_size, 15);
        assert_eq!(config.auth.session_max_age_hours, 4);
        assert!(config.server.secure_cookies);
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"
            page_size = 25

            [auth]
            password = "hunter2"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.page_size, 25);
        assert_eq!(config.auth.password.as_deref(), Some("hunter2"));
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_password_is_not_serialized() {
        let mut config = Config::default();
        config.auth.password = Some("hunter2".to_string());
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(!toml_str.contains("hunter2"));
        assert!(toml_str.contains("[auth]"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "sqlite:/tmp/tracker.db"),
            ("PAGE_SIZE", "40"),
            ("AUTH_PASSWORD", "couch"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env_overrides(|key| env.get(key).map(ToString::to_string))
            .unwrap();

        assert_eq!(config.general.database_path, "sqlite:/tmp/tracker.db");
        assert_eq!(config.general.page_size, 40);
        assert_eq!(config.auth.password.as_deref(), Some("couch"));
    }

    #[test]
    fn test_bad_page_size_override_is_an_error() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(|key| {
            (key == "PAGE_SIZE").then(|| "lots".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_err(), "missing password must be rejected");

        config.auth.password = Some("couch".to_string());
        assert!(config.validate().is_ok());

        config.auth.session_secret = Some("short".to_string());
        assert!(config.validate().is_err());

        config.auth.session_secret = Some("x".repeat(64));
        config.general.page_size = 0;
        assert!(config.validate().is_err());
    }
}
