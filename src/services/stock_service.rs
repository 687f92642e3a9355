//! Stock service
//!
//! Movement processing and the read-side reports built on the ledger.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::dto::stock_dto::{BalanceSummary, LowStockAlert, LowStockReport, TodayStats, TrendPoint};
use crate::models::stock::{Location, NewMovement, StockMovement};
use crate::services::ledger::{self, StockLedger};
use crate::utils::calendar::BusinessCalendar;
use crate::utils::errors::{AppError, AppResult};

/// Trend window used when the caller does not ask for one
pub const DEFAULT_TREND_DAYS: u32 = 7;

/// Longest trend window served
pub const MAX_TREND_DAYS: u32 = 365;

#[derive(Clone)]
pub struct StockService {
    ledger: Arc<dyn StockLedger>,
    calendar: BusinessCalendar,
}

impl StockService {
    pub fn new(ledger: Arc<dyn StockLedger>, calendar: BusinessCalendar) -> Self {
        Self { ledger, calendar }
    }

    pub fn calendar(&self) -> BusinessCalendar {
        self.calendar
    }

    pub async fn current_balance(&self, location: Location) -> AppResult<Decimal> {
        self.ledger.current_balance(location).await
    }

    /// Appends one IN row at `location`
    #[instrument(skip(self, notes))]
    pub async fn record_in(
        &self,
        location: Location,
        amount: Decimal,
        notes: Option<String>,
        user_id: i64,
    ) -> AppResult<StockMovement> {
        ledger::validate_amount(amount)?;
        let notes = normalize_notes(notes);

        let planner = move |balances: &ledger::Balances| -> AppResult<Vec<NewMovement>> {
            Ok(vec![ledger::plan_stock_in(balances, location, amount, notes.clone(), user_id)?])
        };
        let mut rows = self.ledger.append_atomically(&planner).await?;

        let row = rows
            .pop()
            .ok_or_else(|| AppError::Internal("stock IN produced no row".into()))?;
        info!(id = row.id, %location, %amount, balance = %row.balance, "stock in recorded");
        Ok(row)
    }

    /// Appends the OUT rows for `amount`, TUG_ASSIST first
    #[instrument(skip(self, notes))]
    pub async fn record_out(
        &self,
        amount: Decimal,
        notes: Option<String>,
        user_id: i64,
    ) -> AppResult<Vec<StockMovement>> {
        ledger::validate_amount(amount)?;
        let notes = normalize_notes(notes);

        let planner = move |balances: &ledger::Balances| -> AppResult<Vec<NewMovement>> {
            ledger::plan_stock_out(balances, amount, notes.clone(), user_id)
        };
        let rows = self.ledger.append_atomically(&planner).await?;

        info!(%amount, rows = rows.len(), "stock out recorded");
        Ok(rows)
    }

    pub async fn summary(&self, locations: &[Location]) -> AppResult<Vec<BalanceSummary>> {
        let mut summary = Vec::with_capacity(locations.len());
        for &location in locations {
            summary.push(BalanceSummary {
                location,
                balance: self.ledger.current_balance(location).await?,
            });
        }
        Ok(summary)
    }

    pub async fn today_stats(&self, locations: &[Location]) -> AppResult<Vec<TodayStats>> {
        self.today_stats_at(locations, Utc::now()).await
    }

    pub async fn today_stats_at(
        &self,
        locations: &[Location],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<TodayStats>> {
        let start_of_today = self.calendar.start_of_today(now);

        let mut stats = Vec::with_capacity(locations.len());
        for &location in locations {
            let initial_stock = self.ledger.balance_before(location, start_of_today).await?;
            let totals = self.ledger.totals_since(location, start_of_today).await?;
            let final_stock = self.ledger.current_balance(location).await?;

            stats.push(TodayStats {
                location,
                initial_stock,
                today_in: totals.total_in,
                today_out: totals.total_out,
                final_stock,
            });
        }
        Ok(stats)
    }

    pub async fn trend(&self, days: Option<u32>, locations: &[Location]) -> AppResult<Vec<TrendPoint>> {
        self.trend_at(days, locations, Utc::now()).await
    }

    pub async fn trend_at(
        &self,
        days: Option<u32>,
        locations: &[Location],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<TrendPoint>> {
        let days = days.unwrap_or(DEFAULT_TREND_DAYS).clamp(1, MAX_TREND_DAYS);
        let today = self.calendar.local_date(now);
        let first_day = today
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(today);
        let window_start = self.calendar.start_of_day(first_day);

        let mut opening = BTreeMap::new();
        for &location in locations {
            opening.insert(location, self.ledger.balance_before(location, window_start).await?);
        }

        let location_filter = match locations {
            [single] => Some(*single),
            _ => None,
        };
        let movements = self.ledger.movements_since(window_start, location_filter).await?;

        Ok(build_trend(first_day, today, &opening, &movements, &self.calendar))
    }

    pub async fn low_stock_check(
        &self,
        locations: &[Location],
        threshold: Decimal,
    ) -> AppResult<LowStockReport> {
        let alerts: Vec<LowStockAlert> = self
            .summary(locations)
            .await?
            .into_iter()
            .filter(|entry| entry.balance < threshold)
            .map(|entry| LowStockAlert {
                message: format!(
                    "Low stock at {}: {} L (threshold: {} L)",
                    entry.location,
                    entry.balance.normalize(),
                    threshold.normalize()
                ),
                location: entry.location,
                balance: entry.balance,
                threshold,
            })
            .collect();

        Ok(LowStockReport {
            has_alerts: !alerts.is_empty(),
            alerts,
            threshold,
        })
    }
}

/// Trims notes; blank notes are stored as NULL
fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

/// One point per day in `first_day..=last_day` per location in `opening`,
/// carrying the previous closing balance over days without movements.
/// `movements` must be in id order.
pub fn build_trend(
    first_day: NaiveDate,
    last_day: NaiveDate,
    opening: &BTreeMap<Location, Decimal>,
    movements: &[StockMovement],
    calendar: &BusinessCalendar,
) -> Vec<TrendPoint> {
    let mut closing: BTreeMap<(NaiveDate, Location), Decimal> = BTreeMap::new();
    for movement in movements {
        if opening.contains_key(&movement.location) {
            let day = calendar.local_date(movement.created_at);
            closing.insert((day, movement.location), movement.balance);
        }
    }

    let mut running = opening.clone();
    let mut points = Vec::new();
    let mut day = first_day;
    while day <= last_day {
        for (location, balance) in running.iter_mut() {
            if let Some(close) = closing.get(&(day, *location)) {
                *balance = *close;
            }
            points.push(TrendPoint {
                date: day,
                location: *location,
                balance: *balance,
            });
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stock::StockType;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn movement(id: i64, location: Location, balance: Decimal, at: DateTime<Utc>) -> StockMovement {
        StockMovement {
            id,
            stock_type: StockType::In,
            location,
            amount: dec!(1),
            balance,
            notes: None,
            user_id: 1,
            created_at: at,
        }
    }

    #[test]
    fn trend_carries_balances_across_quiet_days() {
        let calendar = BusinessCalendar::from_offset_minutes(0);
        let first = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();

        let opening = BTreeMap::from([(Location::Genset, dec!(100)), (Location::TugAssist, dec!(0))]);
        let movements = vec![
            movement(10, Location::Genset, dec!(150), Utc.with_ymd_and_hms(2026, 5, 2, 8, 0, 0).unwrap()),
            movement(11, Location::Genset, dec!(120), Utc.with_ymd_and_hms(2026, 5, 2, 15, 0, 0).unwrap()),
            movement(12, Location::TugAssist, dec!(40), Utc.with_ymd_and_hms(2026, 5, 3, 9, 0, 0).unwrap()),
        ];

        let points = build_trend(first, last, &opening, &movements, &calendar);
        assert_eq!(points.len(), 8);

        let genset: Vec<Decimal> = points
            .iter()
            .filter(|p| p.location == Location::Genset)
            .map(|p| p.balance)
            .collect();
        assert_eq!(genset, vec![dec!(100), dec!(120), dec!(120), dec!(120)]);

        let tug: Vec<Decimal> = points
            .iter()
            .filter(|p| p.location == Location::TugAssist)
            .map(|p| p.balance)
            .collect();
        assert_eq!(tug, vec![dec!(0), dec!(0), dec!(40), dec!(40)]);
    }

    #[test]
    fn trend_ignores_locations_outside_scope() {
        let calendar = BusinessCalendar::from_offset_minutes(0);
        let day = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let opening = BTreeMap::from([(Location::TugAssist, dec!(5))]);
        let movements = vec![movement(1, Location::Genset, dec!(900), Utc.with_ymd_and_hms(2026, 5, 1, 1, 0, 0).unwrap())];

        let points = build_trend(day, day, &opening, &movements, &calendar);
        assert_eq!(
            points,
            vec![TrendPoint {
                date: day,
                location: Location::TugAssist,
                balance: dec!(5)
            }]
        );
    }

    #[test]
    fn blank_notes_become_none() {
        assert_eq!(normalize_notes(Some("   ".into())), None);
        assert_eq!(normalize_notes(Some(" refill ".into())).as_deref(), Some("refill"));
    }
}
