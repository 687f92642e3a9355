//! Rate limiting middleware
//!
//! Fixed-window request counting per client IP.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::EnvironmentConfig;
use crate::utils::errors::AppError;
use crate::utils::request::ClientAddr;

#[derive(Debug, Clone)]
struct RateLimitInfo {
    requests: u32,
    window_start: Instant,
}

/// Shared counters for one limit
#[derive(Clone)]
pub struct RateLimitState {
    requests: Arc<RwLock<HashMap<String, RateLimitInfo>>>,
    max_requests: u32,
    window_duration: Duration,
}

impl RateLimitState {
    pub fn new(max_requests: u32, window_duration: Duration) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests: max_requests.max(1),
            window_duration,
        }
    }

    /// General API limit
    pub fn from_config(config: &EnvironmentConfig) -> Self {
        Self::new(config.rate_limit_requests, Duration::from_secs(config.rate_limit_window))
    }

    /// Half the general limit, with its own counters, for credential endpoints
    pub fn strict_from_config(config: &EnvironmentConfig) -> Self {
        Self::new(config.rate_limit_requests / 2, Duration::from_secs(config.rate_limit_window))
    }

    /// Counts a request from `ip`, failing once the window is full
    pub async fn check_rate_limit(&self, ip: &str) -> Result<(), AppError> {
        self.check_at(ip, Instant::now()).await
    }

    async fn check_at(&self, ip: &str, now: Instant) -> Result<(), AppError> {
        let mut requests = self.requests.write().await;

        requests.retain(|_, info| now.duration_since(info.window_start) < self.window_duration);

        let info = requests.entry(ip.to_string()).or_insert(RateLimitInfo {
            requests: 0,
            window_start: now,
        });

        if info.requests >= self.max_requests {
            return Err(AppError::RateLimitExceeded);
        }

        info.requests += 1;
        Ok(())
    }
}

pub async fn rate_limit_middleware(
    State(rate_limit_state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = request
        .extensions()
        .get::<ClientAddr>()
        .map(|ClientAddr(ip)| ip.clone())
        .unwrap_or_else(|| "unknown".to_string());

    if let Err(e) = rate_limit_state.check_rate_limit(&ip).await {
        warn!(%ip, path = %request.uri().path(), "rate limit exceeded");
        return Err(e);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn requests_beyond_the_limit_are_rejected() {
        let state = RateLimitState::new(2, Duration::from_secs(60));
        let now = Instant::now();

        assert!(state.check_at("10.0.0.1", now).await.is_ok());
        assert!(state.check_at("10.0.0.1", now).await.is_ok());
        assert!(matches!(
            state.check_at("10.0.0.1", now).await,
            Err(AppError::RateLimitExceeded)
        ));
        // other clients have their own budget
        assert!(state.check_at("10.0.0.2", now).await.is_ok());
    }

    #[tokio::test]
    async fn counters_reset_after_the_window() {
        let state = RateLimitState::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(state.check_at("10.0.0.1", start).await.is_ok());
        assert!(state.check_at("10.0.0.1", start).await.is_err());
        assert!(state
            .check_at("10.0.0.1", start + Duration::from_secs(61))
            .await
            .is_ok());
    }
}
