use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::settings::{Setting, DEFAULT_LOW_STOCK_THRESHOLD, LOW_STOCK_THRESHOLD_KEY};
use crate::utils::errors::AppError;
use crate::utils::validation::parse_threshold;

pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    /// Stored threshold, or the default when unset or unparseable
    pub async fn low_stock_threshold(&self) -> Result<Decimal, AppError> {
        let threshold = self
            .get(LOW_STOCK_THRESHOLD_KEY)
            .await?
            .and_then(|raw| parse_threshold(&raw))
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);

        Ok(threshold)
    }

    /// Every stored setting, with defaults filled in for known keys
    pub async fn all(&self) -> Result<BTreeMap<String, String>, AppError> {
        let rows = sqlx::query_as::<_, Setting>("SELECT * FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        let mut settings = BTreeMap::from([(
            LOW_STOCK_THRESHOLD_KEY.to_string(),
            DEFAULT_LOW_STOCK_THRESHOLD.to_string(),
        )]);
        settings.extend(rows.into_iter().map(|row| (row.key, row.value)));

        Ok(settings)
    }

    pub async fn upsert(&self, key: &str, value: &str) -> Result<Setting, AppError> {
        let row = sqlx::query_as::<_, Setting>(
            r#"
            INSERT INTO settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            RETURNING *
            "#,
        )
        .bind(key)
        .bind(value)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
