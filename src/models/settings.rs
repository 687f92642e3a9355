//! Key/value settings store model

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// Low stock threshold in liters
pub const LOW_STOCK_THRESHOLD_KEY: &str = "low_stock_threshold";

/// Threshold used when the setting has never been saved
pub const DEFAULT_LOW_STOCK_THRESHOLD: Decimal = Decimal::ONE_HUNDRED;

/// Keys accepted by the settings endpoint
pub const KNOWN_SETTING_KEYS: &[&str] = &[LOW_STOCK_THRESHOLD_KEY];

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Setting {
    pub id: i64,
    pub key: String,
    pub value: String,
}
