//! Shared application state
//!
//! Cloned into every handler through axum's `State` extractor.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::middleware::rate_limit::RateLimitState;
use crate::repositories::stock_repository::StockRepository;
use crate::services::{AuditService, StockLedger, StockService};
use crate::utils::calendar::BusinessCalendar;
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub jwt: JwtConfig,
    pub calendar: BusinessCalendar,
    pub stock_service: StockService,
    pub audit: AuditService,
    pub rate_limit: RateLimitState,
    pub auth_rate_limit: RateLimitState,
}

impl AppState {
    /// State backed by the Postgres ledger
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        let ledger = Arc::new(StockRepository::new(pool.clone()));
        Self::with_ledger(pool, config, ledger)
    }

    /// State with a caller-supplied ledger implementation
    pub fn with_ledger(pool: PgPool, config: EnvironmentConfig, ledger: Arc<dyn StockLedger>) -> Self {
        let calendar = BusinessCalendar::from_offset_minutes(config.utc_offset_minutes);

        Self {
            jwt: JwtConfig::from(&config),
            calendar,
            stock_service: StockService::new(ledger, calendar),
            audit: AuditService::new(pool.clone()),
            rate_limit: RateLimitState::from_config(&config),
            auth_rate_limit: RateLimitState::strict_from_config(&config),
            pool,
            config,
        }
    }
}
