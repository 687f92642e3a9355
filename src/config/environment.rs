//! Environment configuration
//!
//! Reads the service settings from process environment variables (loaded from
//! `.env` by `dotenvy` in `main`).

use std::env;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Secret used outside production when JWT_SECRET is not set
const DEVELOPMENT_JWT_SECRET: &str = "development-only-secret-change-me";

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub jwt_expiration: u64,
    pub refresh_token_days: i64,
    pub cors_origins: Vec<String>,
    pub rate_limit_requests: u32,
    /// Rate limit window in seconds
    pub rate_limit_window: u64,
    /// Business day offset east of UTC, in minutes
    pub utc_offset_minutes: i32,
    /// Take the client address from `X-Forwarded-For`/`X-Real-IP`; only safe behind a proxy that sets them
    pub trust_proxy: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 4111,
            host: "0.0.0.0".to_string(),
            jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
            jwt_expiration: 3600,
            refresh_token_days: 30,
            cors_origins: Vec::new(),
            rate_limit_requests: 100,
            rate_limit_window: 60,
            utc_offset_minutes: 8 * 60,
            trust_proxy: false,
        }
    }
}

impl EnvironmentConfig {
    /// Builds the configuration from the environment, falling back to
    /// development defaults for anything unset
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if environment == "production" => bail!("JWT_SECRET must be set in production"),
            _ => defaults.jwt_secret,
        };

        Ok(Self {
            port: parse_var("PORT", defaults.port)?,
            host: env::var("HOST").unwrap_or(defaults.host),
            jwt_secret,
            jwt_expiration: parse_var("JWT_EXPIRATION", defaults.jwt_expiration)?,
            refresh_token_days: parse_var("REFRESH_TOKEN_DAYS", defaults.refresh_token_days)?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| parse_origins(&origins))
                .unwrap_or_default(),
            rate_limit_requests: parse_var("RATE_LIMIT_REQUESTS", defaults.rate_limit_requests)?,
            rate_limit_window: parse_var("RATE_LIMIT_WINDOW", defaults.rate_limit_window)?,
            utc_offset_minutes: parse_var("BUSINESS_UTC_OFFSET_MINUTES", defaults.utc_offset_minutes)?,
            trust_proxy: parse_var("TRUST_PROXY", defaults.trust_proxy)?,
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value", name)),
        _ => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_origins(" http://localhost:5173 ,, https://bbm.example.com "),
            vec!["http://localhost:5173", "https://bbm.example.com"]
        );
    }

    #[test]
    fn defaults_match_the_dashboard_setup() {
        let config = EnvironmentConfig::default();
        assert_eq!(config.server_url(), "0.0.0.0:4111");
        assert!(config.is_development());
        assert!(!config.is_production());
        assert_eq!(config.refresh_token_days, 30);
        assert!(!config.trust_proxy);
    }
}
