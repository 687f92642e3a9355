//! Refresh token model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Opaque refresh token row; consumed (deleted) on every rotation
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
