//! In-process ledger
//!
//! `StockLedger` backed by a vector behind a mutex. Appends hold the lock for
//! the whole read-plan-write cycle, which gives the same per-location
//! serialization the Postgres ledger gets from advisory locks. Used by tests
//! and local tooling that runs without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::models::stock::{Location, NewMovement, StockMovement, StockType};
use crate::services::ledger::{Balances, MovementTotals, Planner, StockLedger};
use crate::utils::errors::AppResult;

#[derive(Debug, Default)]
pub struct InMemoryLedger {
    rows: Mutex<Vec<StockMovement>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row with an explicit timestamp, bypassing planning.
    /// `movement.balance` is stored as given.
    pub async fn insert_at(&self, movement: NewMovement, created_at: DateTime<Utc>) -> StockMovement {
        let mut rows = self.rows.lock().await;
        let row = materialize(&rows, movement, created_at);
        rows.push(row.clone());
        row
    }

    /// Snapshot of every row in id order
    pub async fn rows(&self) -> Vec<StockMovement> {
        self.rows.lock().await.clone()
    }
}

fn materialize(rows: &[StockMovement], movement: NewMovement, created_at: DateTime<Utc>) -> StockMovement {
    StockMovement {
        id: rows.last().map(|row| row.id + 1).unwrap_or(1),
        stock_type: movement.stock_type,
        location: movement.location,
        amount: movement.amount,
        balance: movement.balance,
        notes: movement.notes,
        user_id: movement.user_id,
        created_at,
    }
}

fn latest_balance<'a>(
    rows: impl DoubleEndedIterator<Item = &'a StockMovement>,
    location: Location,
) -> Decimal {
    rows.rev()
        .find(|row| row.location == location)
        .map(|row| row.balance)
        .unwrap_or(Decimal::ZERO)
}

#[async_trait]
impl StockLedger for InMemoryLedger {
    async fn current_balance(&self, location: Location) -> AppResult<Decimal> {
        let rows = self.rows.lock().await;
        Ok(latest_balance(rows.iter(), location))
    }

    async fn balance_before(&self, location: Location, before: DateTime<Utc>) -> AppResult<Decimal> {
        let rows = self.rows.lock().await;
        Ok(latest_balance(
            rows.iter().filter(|row| row.created_at < before),
            location,
        ))
    }

    async fn totals_since(&self, location: Location, since: DateTime<Utc>) -> AppResult<MovementTotals> {
        let rows = self.rows.lock().await;
        let totals = rows
            .iter()
            .filter(|row| row.location == location && row.created_at >= since)
            .fold(MovementTotals::default(), |mut acc, row| {
                match row.stock_type {
                    StockType::In => acc.total_in += row.amount,
                    StockType::Out => acc.total_out += row.amount,
                }
                acc
            });
        Ok(totals)
    }

    async fn movements_since(
        &self,
        since: DateTime<Utc>,
        location: Option<Location>,
    ) -> AppResult<Vec<StockMovement>> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .filter(|row| row.created_at >= since)
            .filter(|row| location.map_or(true, |l| row.location == l))
            .cloned()
            .collect())
    }

    async fn append_atomically(&self, planner: Planner<'_>) -> AppResult<Vec<StockMovement>> {
        let mut rows = self.rows.lock().await;

        let mut balances = Balances::default();
        for location in Location::ALL {
            balances.set(location, latest_balance(rows.iter(), location));
        }

        let planned = planner(&balances)?;
        let now = Utc::now();

        let mut inserted = Vec::with_capacity(planned.len());
        for movement in planned {
            let row = materialize(&rows, movement, now);
            rows.push(row.clone());
            inserted.push(row);
        }

        Ok(inserted)
    }
}
