//! Token manager configuration.
//!
//! A [`Config`] is plain input: empty or non-positive fields are replaced with
//! defaults when a [`Manager`](crate::Manager) is built from it. Configuration
//! can be assembled in code or loaded from YAML:
//!
//! ```yaml
//! prefix: FMC
//! issuer: fundme.cloud
//! secret_env: WARDEN_SECRET
//! access_ttl: 15m
//! refresh_ttl: 7d
//! purpose_ttl: 30m
//! algorithm: HS256
//! ```

use chrono::Duration;
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::duration::serde_ttl;

/// Prefix used for token ids when none is configured.
pub const DEFAULT_PREFIX: &str = "jwt";

/// Default lifetime of access tokens, in seconds (15 minutes).
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 15 * 60;

/// Default lifetime of refresh tokens, in seconds (7 days).
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Default lifetime of purpose tokens, in seconds (30 minutes).
pub const DEFAULT_PURPOSE_TTL_SECS: i64 = 30 * 60;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Signing and lifetime settings for a token manager.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix for generated token ids (`jti`).
    pub prefix: String,

    /// HMAC secret. Never serialized.
    #[serde(skip_serializing)]
    pub secret: String,

    /// Environment variable holding the secret, used when `secret` is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_env: Option<String>,

    /// File holding the secret, used when neither `secret` nor `secret_env` yield one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_file: Option<PathBuf>,

    /// Value of the `iss` claim on every issued token.
    pub issuer: String,

    /// Lifetime of access tokens.
    #[serde(with = "serde_ttl")]
    pub access_ttl: Duration,

    /// Lifetime of refresh tokens.
    #[serde(with = "serde_ttl")]
    pub refresh_ttl: Duration,

    /// Lifetime of purpose tokens.
    #[serde(with = "serde_ttl")]
    pub purpose_ttl: Duration,

    /// HMAC variant used for signing (HS256, HS384 or HS512).
    pub algorithm: Algorithm,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            secret: String::new(),
            secret_env: None,
            secret_file: None,
            issuer: String::new(),
            access_ttl: Duration::zero(),
            refresh_ttl: Duration::zero(),
            purpose_ttl: Duration::zero(),
            algorithm: Algorithm::HS256,
        }
    }
}

impl Config {
    /// Create a configuration with the given secret and defaults elsewhere.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the token id prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets the access token lifetime.
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Sets the refresh token lifetime.
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Sets the purpose token lifetime.
    pub fn with_purpose_ttl(mut self, ttl: Duration) -> Self {
        self.purpose_ttl = ttl;
        self
    }

    /// Sets the signing algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Read configuration from a YAML file without resolving the secret.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Read configuration from a YAML file and resolve the secret into `secret`.
    ///
    /// A relative `secret_file` is resolved against the directory holding the
    /// configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        if let (Some(secret_file), Some(base_dir)) = (&config.secret_file, path.parent())
            && secret_file.is_relative()
        {
            config.secret_file = Some(base_dir.join(secret_file));
        }

        if let Some(secret) = config.resolve_secret()? {
            config.secret = secret;
        }
        Ok(config)
    }

    /// Resolve the secret: inline value first, then environment, then file.
    pub fn resolve_secret(&self) -> Result<Option<String>, ConfigError> {
        if !self.secret.is_empty() {
            return Ok(Some(self.secret.clone()));
        }

        if let Some(env_var) = &self.secret_env
            && let Ok(secret) = std::env::var(env_var)
            && !secret.is_empty()
        {
            return Ok(Some(secret));
        }

        if let Some(path) = &self.secret_file {
            if !path.exists() {
                return Err(ConfigError::Config(format!(
                    "Secret file not found: {}",
                    path.display()
                )));
            }
            let secret = fs::read_to_string(path)?;
            return Ok(Some(secret.trim().to_string()));
        }

        Ok(None)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("prefix", &self.prefix)
            .field("secret", &"[redacted]")
            .field("secret_env", &self.secret_env)
            .field("secret_file", &self.secret_file)
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("purpose_ttl", &self.purpose_ttl)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}
