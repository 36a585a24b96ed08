//! Application configuration, read from the environment.

use crate::auth::TokenKeys;
use crate::error::{JoblyError, JoblyResult};
use std::time::Duration;

const DEV_SECRET_KEY: &str = "secret-dev";

/// Shared configuration for the data layer and token handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HMAC secret used to sign and verify tokens.
    pub secret_key: String,
    /// Port for the HTTP front end. Nothing in this crate listens on it; the
    /// server binary reads it from here.
    pub port: u16,
    /// Postgres connection URL.
    pub database_url: String,
    /// Lifetime of issued tokens.
    pub token_ttl: Duration,
    /// Maximum pooled connections.
    pub pool_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret_key: DEV_SECRET_KEY.to_string(),
            port: 3001,
            database_url: default_database_url(false),
            token_ttl: Duration::from_secs(24 * 60 * 60),
            pool_size: 16,
        }
    }
}

fn default_database_url(test: bool) -> String {
    if test {
        "postgresql:///jobly_test".to_string()
    } else {
        "postgresql:///jobly".to_string()
    }
}

impl Config {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> JoblyResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> JoblyResult<Self> {
        let mut config = Self::default();

        match lookup("SECRET_KEY") {
            Some(secret) if !secret.is_empty() => config.secret_key = secret,
            _ => tracing::warn!("SECRET_KEY not set, using the development key"),
        }

        if let Some(port) = lookup("PORT") {
            config.port = parse_var("PORT", &port)?;
        }

        let test = lookup("JOBLY_ENV").is_some_and(|env| env == "test");
        config.database_url = match lookup("DATABASE_URL") {
            Some(url) if !test => url,
            _ => default_database_url(test),
        };

        if let Some(ttl) = lookup("TOKEN_TTL_SECS") {
            config.token_ttl = Duration::from_secs(parse_var("TOKEN_TTL_SECS", &ttl)?);
        }

        if let Some(size) = lookup("DB_POOL_SIZE") {
            config.pool_size = parse_var("DB_POOL_SIZE", &size)?;
            if config.pool_size == 0 {
                return Err(JoblyError::Config("DB_POOL_SIZE must be at least 1".into()));
            }
        }

        Ok(config)
    }

    pub fn secret_key(mut self, secret: impl Into<String>) -> Self {
        self.secret_key = secret.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Token keys derived from the secret and TTL.
    pub fn token_keys(&self) -> TokenKeys {
        TokenKeys::new(self.secret_key.as_bytes(), self.token_ttl)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> JoblyResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| JoblyError::Config(format!("invalid {name} '{raw}': {e}")))
}
