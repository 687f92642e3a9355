//! Stock ledger core
//!
//! Balance resolution and movement planning. The arithmetic here is pure;
//! persistence goes through the `StockLedger` trait, whose implementations
//! must run "read balances, plan, append" as one serialized unit so that the
//! running balance of a location never forks under concurrent writers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::stock::{Location, NewMovement, StockMovement, StockType};
use crate::utils::errors::{validation_error, AppError, AppResult};

/// Largest single movement accepted, in liters
pub const MAX_MOVEMENT_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Largest balance the `NUMERIC(12, 2)` column holds: 9,999,999,999.99
pub const MAX_BALANCE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Current balance of every location
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balances {
    pub genset: Decimal,
    pub tug_assist: Decimal,
}

impl Balances {
    pub fn get(&self, location: Location) -> Decimal {
        match location {
            Location::Genset => self.genset,
            Location::TugAssist => self.tug_assist,
        }
    }

    pub fn set(&mut self, location: Location, balance: Decimal) {
        match location {
            Location::Genset => self.genset = balance,
            Location::TugAssist => self.tug_assist = balance,
        }
    }

    pub fn total(&self) -> Decimal {
        self.genset + self.tug_assist
    }
}

/// IN and OUT sums over a period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementTotals {
    pub total_in: Decimal,
    pub total_out: Decimal,
}

/// Computes the rows to append from the balances read inside the write unit
pub type Planner<'a> = &'a (dyn Fn(&Balances) -> AppResult<Vec<NewMovement>> + Send + Sync);

/// Persistence seam of the ledger
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Balance of the most recent row for `location`, or zero
    async fn current_balance(&self, location: Location) -> AppResult<Decimal>;

    /// Balance of the most recent row created strictly before `before`, or zero
    async fn balance_before(&self, location: Location, before: DateTime<Utc>) -> AppResult<Decimal>;

    /// IN/OUT sums of rows created at or after `since`
    async fn totals_since(&self, location: Location, since: DateTime<Utc>) -> AppResult<MovementTotals>;

    /// Rows created at or after `since`, ordered by id ascending
    async fn movements_since(
        &self,
        since: DateTime<Utc>,
        location: Option<Location>,
    ) -> AppResult<Vec<StockMovement>>;

    /// Reads current balances, asks `planner` for the rows to write and
    /// appends them, all without interleaving with other appends.
    /// Rows come back in planner order.
    async fn append_atomically(&self, planner: Planner<'_>) -> AppResult<Vec<StockMovement>>;
}

/// Rejects non-positive, oversized or sub-centiliter amounts
pub fn validate_amount(amount: Decimal) -> AppResult<()> {
    if amount <= Decimal::ZERO {
        return Err(validation_error(
            "amount",
            "positive",
            "Amount must be greater than zero",
        ));
    }
    if amount > MAX_MOVEMENT_AMOUNT {
        return Err(validation_error(
            "amount",
            "range",
            "Amount exceeds the maximum single movement",
        ));
    }
    if amount.normalize().scale() > 2 {
        return Err(validation_error(
            "amount",
            "scale",
            "Amount supports at most 2 decimal places",
        ));
    }
    Ok(())
}

/// Row for a stock IN at `location`; the resulting balance must fit the ledger column
pub fn plan_stock_in(
    balances: &Balances,
    location: Location,
    amount: Decimal,
    notes: Option<String>,
    user_id: i64,
) -> AppResult<NewMovement> {
    let balance = balances.get(location) + StockType::In.signed(amount);
    if balance > MAX_BALANCE {
        return Err(validation_error(
            "amount",
            "capacity",
            &format!("Balance at {} cannot exceed {} L", location, MAX_BALANCE),
        ));
    }

    Ok(NewMovement {
        stock_type: StockType::In,
        location,
        amount,
        balance,
        notes,
        user_id,
    })
}

/// Rows for a stock OUT: TUG_ASSIST is drained first, GENSET covers the rest.
/// Locations with nothing deducted get no row.
pub fn plan_stock_out(
    balances: &Balances,
    amount: Decimal,
    notes: Option<String>,
    user_id: i64,
) -> AppResult<Vec<NewMovement>> {
    let available = balances.total();
    if amount > available {
        return Err(AppError::InsufficientStock {
            requested: amount,
            available,
        });
    }

    let tug_deduction = amount.min(balances.tug_assist.max(Decimal::ZERO));
    let genset_deduction = amount - tug_deduction;

    let mut rows = Vec::with_capacity(2);
    for (location, deduction) in [
        (Location::TugAssist, tug_deduction),
        (Location::Genset, genset_deduction),
    ] {
        if deduction > Decimal::ZERO {
            rows.push(NewMovement {
                stock_type: StockType::Out,
                location,
                amount: deduction,
                balance: balances.get(location) + StockType::Out.signed(deduction),
                notes: notes.clone(),
                user_id,
            });
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn balances(genset: Decimal, tug_assist: Decimal) -> Balances {
        Balances { genset, tug_assist }
    }

    #[test]
    fn stock_in_adds_to_the_location_balance() {
        let row = plan_stock_in(&balances(dec!(10), dec!(5)), Location::TugAssist, dec!(2.5), None, 1).unwrap();
        assert_eq!(row.stock_type, StockType::In);
        assert_eq!(row.balance, dec!(7.5));
    }

    #[test]
    fn stock_in_cannot_overflow_the_balance_column() {
        assert_eq!(MAX_BALANCE, dec!(9999999999.99));

        let near_full = balances(dec!(9500000000), dec!(0));
        let err = plan_stock_in(&near_full, Location::Genset, dec!(500000000), None, 1).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let row = plan_stock_in(&near_full, Location::Genset, dec!(499999999.99), None, 1).unwrap();
        assert_eq!(row.balance, MAX_BALANCE);

        // the other location is unaffected
        assert!(plan_stock_in(&near_full, Location::TugAssist, dec!(500000000), None, 1).is_ok());
    }

    #[test]
    fn out_within_tug_balance_touches_only_tug() {
        let rows = plan_stock_out(&balances(dec!(500), dec!(80)), dec!(80), None, 1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].location, Location::TugAssist);
        assert_eq!(rows[0].balance, dec!(0));
    }

    #[test]
    fn out_beyond_tug_spills_into_genset() {
        let rows = plan_stock_out(&balances(dec!(500), dec!(80)), dec!(100), Some("ops".into()), 7).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].location, Location::TugAssist);
        assert_eq!(rows[0].amount, dec!(80));
        assert_eq!(rows[0].balance, dec!(0));

        assert_eq!(rows[1].location, Location::Genset);
        assert_eq!(rows[1].amount, dec!(20));
        assert_eq!(rows[1].balance, dec!(480));
        assert_eq!(rows[1].notes.as_deref(), Some("ops"));
    }

    #[test]
    fn out_with_empty_tug_only_touches_genset() {
        let rows = plan_stock_out(&balances(dec!(50), dec!(0)), dec!(20), None, 1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].location, Location::Genset);
        assert_eq!(rows[0].balance, dec!(30));
    }

    #[test]
    fn out_over_total_is_insufficient() {
        let err = plan_stock_out(&balances(dec!(500), dec!(80)), dec!(580.01), None, 1).unwrap_err();
        match err {
            AppError::InsufficientStock { requested, available } => {
                assert_eq!(requested, dec!(580.01));
                assert_eq!(available, dec!(580));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn out_of_exact_total_drains_both() {
        let rows = plan_stock_out(&balances(dec!(500), dec!(80)), dec!(580), None, 1).unwrap();
        assert!(rows.iter().all(|row| row.balance == Decimal::ZERO));
    }

    #[test]
    fn amounts_must_be_positive_and_centiliter_precise() {
        assert!(validate_amount(dec!(0)).is_err());
        assert!(validate_amount(dec!(-5)).is_err());
        assert!(validate_amount(dec!(1.005)).is_err());
        assert!(validate_amount(dec!(1000000000.01)).is_err());
        assert!(validate_amount(dec!(12.50)).is_ok());
        assert!(validate_amount(dec!(1.10000)).is_ok());
    }
}
