use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::system_log::{ActionCount, NewSystemLog, SystemLogRow, UserActivity};
use crate::repositories::stock_repository::escape_like;
use crate::utils::errors::AppError;

/// Filters for the audit listing
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub user_id: Option<i64>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

pub struct SystemLogRepository {
    pool: PgPool,
}

impl SystemLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, entry: &NewSystemLog) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO system_logs (user_id, action, entity_type, entity_id, ip_address, user_agent, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(&entry.details)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn count(&self, filter: &LogFilter) -> Result<i64, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM system_logs l LEFT JOIN users u ON u.id = l.user_id",
        );
        push_log_filters(&mut builder, filter);

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    pub async fn list(&self, filter: &LogFilter, limit: i64, offset: i64) -> Result<Vec<SystemLogRow>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            r#"
            SELECT l.id, l.user_id, l.action, l.entity_type, l.entity_id, l.ip_address,
                   l.details, l.created_at, u.name AS user_name, u.email AS user_email
            FROM system_logs l
            LEFT JOIN users u ON u.id = l.user_id
            "#,
        );
        push_log_filters(&mut builder, filter);
        builder
            .push(" ORDER BY l.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = builder
            .build_query_as::<SystemLogRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn count_since(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM system_logs WHERE created_at >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    pub async fn counts_by_action(&self, since: DateTime<Utc>) -> Result<Vec<ActionCount>, AppError> {
        let rows = sqlx::query_as::<_, ActionCount>(
            r#"
            SELECT action, COUNT(*) AS count
            FROM system_logs
            WHERE created_at >= $1
            GROUP BY action
            ORDER BY count DESC, action ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn top_users(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<UserActivity>, AppError> {
        let rows = sqlx::query_as::<_, UserActivity>(
            r#"
            SELECT l.user_id AS user_id, u.name AS user_name, u.email AS user_email, COUNT(*) AS count
            FROM system_logs l
            LEFT JOIN users u ON u.id = l.user_id
            WHERE l.created_at >= $1 AND l.user_id IS NOT NULL
            GROUP BY l.user_id, u.name, u.email
            ORDER BY count DESC, l.user_id ASC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Deletes entries created before `cutoff`, returning how many were removed
    pub async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM system_logs WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn push_log_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &LogFilter) {
    builder.push(" WHERE TRUE");

    if let Some(action) = filter.action.as_deref().filter(|a| !a.is_empty()) {
        builder.push(" AND l.action = ").push_bind(action.to_string());
    }
    if let Some(entity_type) = filter.entity_type.as_deref().filter(|e| !e.is_empty()) {
        builder.push(" AND l.entity_type = ").push_bind(entity_type.to_string());
    }
    if let Some(user_id) = filter.user_id {
        builder.push(" AND l.user_id = ").push_bind(user_id);
    }
    if let Some(start) = filter.start {
        builder.push(" AND l.created_at >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        builder.push(" AND l.created_at < ").push_bind(end);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (l.details ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR l.action ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
