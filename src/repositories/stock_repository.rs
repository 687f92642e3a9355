use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use crate::models::stock::{Location, NewMovement, StockHistoryRow, StockMovement, StockType};
use crate::services::ledger::{Balances, MovementTotals, Planner, StockLedger};
use crate::utils::errors::AppError;

/// Namespace for the per-location advisory locks taken by ledger writes
const LEDGER_LOCK_NAMESPACE: i64 = 0x4242_4D00;

/// Filters shared by the history listing and the export
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub stock_type: Option<StockType>,
    pub location: Option<Location>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

pub struct StockRepository {
    pool: PgPool,
}

impl StockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn count_history(&self, filter: &HistoryFilter) -> Result<i64, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM stocks s LEFT JOIN users u ON u.id = s.user_id",
        );
        push_history_filters(&mut builder, filter);

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    pub async fn find_history(
        &self,
        filter: &HistoryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StockHistoryRow>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            r#"
            SELECT s.id, s.type, s.location, s.amount, s.balance, s.notes, s.created_at,
                   u.name AS user_name
            FROM stocks s
            LEFT JOIN users u ON u.id = s.user_id
            "#,
        );
        push_history_filters(&mut builder, filter);
        builder
            .push(" ORDER BY s.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = builder
            .build_query_as::<StockHistoryRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

fn push_history_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &HistoryFilter) {
    builder.push(" WHERE TRUE");

    if let Some(stock_type) = filter.stock_type {
        builder.push(" AND s.type = ").push_bind(stock_type);
    }
    if let Some(location) = filter.location {
        builder.push(" AND s.location = ").push_bind(location);
    }
    if let Some(start) = filter.start {
        builder.push(" AND s.created_at >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        builder.push(" AND s.created_at < ").push_bind(end);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (s.notes ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Escapes LIKE wildcards so user input matches literally
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl StockLedger for StockRepository {
    async fn current_balance(&self, location: Location) -> Result<Decimal, AppError> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            "SELECT balance FROM stocks WHERE location = $1 ORDER BY id DESC LIMIT 1",
        )
        .bind(location)
        .fetch_optional(&self.pool)
        .await?;

        Ok(balance.unwrap_or(Decimal::ZERO))
    }

    async fn balance_before(
        &self,
        location: Location,
        before: DateTime<Utc>,
    ) -> Result<Decimal, AppError> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT balance FROM stocks
            WHERE location = $1 AND created_at < $2
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(location)
        .bind(before)
        .fetch_optional(&self.pool)
        .await?;

        Ok(balance.unwrap_or(Decimal::ZERO))
    }

    async fn totals_since(
        &self,
        location: Location,
        since: DateTime<Utc>,
    ) -> Result<MovementTotals, AppError> {
        let (total_in, total_out) = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE type = 'IN'), 0),
                COALESCE(SUM(amount) FILTER (WHERE type = 'OUT'), 0)
            FROM stocks
            WHERE location = $1 AND created_at >= $2
            "#,
        )
        .bind(location)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(MovementTotals { total_in, total_out })
    }

    async fn movements_since(
        &self,
        since: DateTime<Utc>,
        location: Option<Location>,
    ) -> Result<Vec<StockMovement>, AppError> {
        let rows = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT * FROM stocks
            WHERE created_at >= $1
              AND ($2::stock_location IS NULL OR location = $2)
            ORDER BY id ASC
            "#,
        )
        .bind(since)
        .bind(location)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self, planner))]
    async fn append_atomically(&self, planner: Planner<'_>) -> Result<Vec<StockMovement>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Fixed lock order keeps two-location OUTs deadlock free
        let mut balances = Balances::default();
        for location in Location::ALL {
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(LEDGER_LOCK_NAMESPACE + i64::from(location.code()))
                .execute(&mut *tx)
                .await?;

            let balance = sqlx::query_scalar::<_, Decimal>(
                "SELECT balance FROM stocks WHERE location = $1 ORDER BY id DESC LIMIT 1",
            )
            .bind(location)
            .fetch_optional(&mut *tx)
            .await?;
            balances.set(location, balance.unwrap_or(Decimal::ZERO));
        }

        let planned: Vec<NewMovement> = planner(&balances)?;

        let mut inserted = Vec::with_capacity(planned.len());
        for movement in planned {
            let row = sqlx::query_as::<_, StockMovement>(
                r#"
                INSERT INTO stocks (type, location, amount, balance, notes, user_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(movement.stock_type)
            .bind(movement.location)
            .bind(movement.amount)
            .bind(movement.balance)
            .bind(movement.notes)
            .bind(movement.user_id)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(row);
        }

        tx.commit().await?;

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("solar"), "solar");
    }

    #[test]
    fn filters_render_in_a_stable_order() {
        let filter = HistoryFilter {
            stock_type: Some(StockType::Out),
            location: Some(Location::Genset),
            search: Some("  shift  ".into()),
            ..Default::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM stocks s");
        push_history_filters(&mut builder, &filter);

        let sql = builder.sql();
        assert!(sql.contains("s.type = $1"));
        assert!(sql.contains("s.location = $2"));
        assert!(sql.contains("s.notes ILIKE $3 OR u.name ILIKE $4"));
        assert!(!sql.contains("created_at"));
    }

    #[test]
    fn blank_search_is_ignored() {
        let filter = HistoryFilter {
            search: Some("   ".into()),
            ..Default::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM stocks s");
        push_history_filters(&mut builder, &filter);
        assert!(!builder.sql().contains("ILIKE"));
    }
}
