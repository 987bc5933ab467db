//! Authentication configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use wata_db::RetryPolicy;

/// Main authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Account provisioning configuration
    pub registry: RegistryConfig,
}

/// JWT token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens (should be at least 256 bits)
    pub secret: String,
    /// Access token lifetime
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,
    /// Token issuer claim
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set in production
            access_token_lifetime: Duration::from_secs(365 * 24 * 60 * 60), // 1 year
            issuer: "prod-aibot-backend-issuer".to_string(),
        }
    }
}

/// Read-after-insert behaviour of the account registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub retry: RetryPolicy,
}

impl AuthConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            config.jwt.secret = secret;
        }
        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            config.jwt.issuer = issuer;
        }
        if let Ok(lifetime) = std::env::var("JWT_ACCESS_TOKEN_LIFETIME") {
            config.jwt.access_token_lifetime = parse_duration("JWT_ACCESS_TOKEN_LIFETIME", &lifetime)?;
        }

        if let Ok(attempts) = std::env::var("REGISTRY_RETRY_ATTEMPTS") {
            config.registry.retry.max_attempts = attempts
                .parse()
                .map_err(|e| format!("REGISTRY_RETRY_ATTEMPTS: {}", e))?;
        }
        if let Ok(interval) = std::env::var("REGISTRY_RETRY_INTERVAL") {
            config.registry.retry.interval = parse_duration("REGISTRY_RETRY_INTERVAL", &interval)?;
        }

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.jwt.secret.is_empty() {
            errors.push("JWT secret must be set".to_string());
        } else if self.jwt.secret.len() < 32 {
            errors.push("JWT secret should be at least 256 bits (32 bytes)".to_string());
        }
        if self.jwt.issuer.is_empty() {
            errors.push("JWT issuer must not be empty".to_string());
        }
        if self.jwt.access_token_lifetime.is_zero() {
            errors.push("Access token lifetime must be positive".to_string());
        }

        if self.registry.retry.max_attempts == 0 {
            errors.push("Registry retry needs at least one attempt".to_string());
        }
        let backoff = self.registry.retry.backoff;
        if !backoff.is_finite() || backoff < 1.0 {
            errors.push("Registry retry backoff must be a finite factor of at least 1.0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn parse_duration(name: &str, value: &str) -> Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(value).map_err(|e| format!("{}: {}", name, e))
}
