//! Stock ledger model
//!
//! A `StockMovement` is one immutable IN or OUT row of the `stocks` table,
//! carrying the running balance of its location right after it was applied.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

/// Movement direction - maps to the `stock_type` enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "stock_type")]
pub enum StockType {
    #[serde(rename = "IN")]
    #[sqlx(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    #[sqlx(rename = "OUT")]
    Out,
}

impl StockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockType::In => "IN",
            StockType::Out => "OUT",
        }
    }

    /// Signed contribution of `amount` to the running balance
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            StockType::In => amount,
            StockType::Out => -amount,
        }
    }
}

impl fmt::Display for StockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN" => Ok(StockType::In),
            "OUT" => Ok(StockType::Out),
            other => Err(format!("unknown stock type '{}'", other)),
        }
    }
}

/// Physical fueling point - maps to the `stock_location` enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Type)]
#[sqlx(type_name = "stock_location", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Location {
    Genset,
    TugAssist,
}

impl Location {
    /// Every location, in lock order
    pub const ALL: [Location; 2] = [Location::Genset, Location::TugAssist];

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Genset => "GENSET",
            Location::TugAssist => "TUG_ASSIST",
        }
    }

    /// Numeric code stored on users (1 = GENSET, 2 = TUG_ASSIST)
    pub fn code(&self) -> i16 {
        match self {
            Location::Genset => 1,
            Location::TugAssist => 2,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Location::Genset),
            2 => Some(Location::TugAssist),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GENSET" => Ok(Location::Genset),
            "TUG_ASSIST" => Ok(Location::TugAssist),
            other => Err(format!("unknown location '{}'", other)),
        }
    }
}

/// One ledger row - maps exactly to the `stocks` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub stock_type: StockType,
    pub location: Location,
    pub amount: Decimal,
    pub balance: Decimal,
    pub notes: Option<String>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Ledger row joined with the acting user's name, used by history and export
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockHistoryRow {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub stock_type: StockType,
    pub location: Location,
    pub amount: Decimal,
    pub balance: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_name: Option<String>,
}

/// A movement about to be appended; `balance` is computed by the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    pub stock_type: StockType,
    pub location: Location,
    pub amount: Decimal,
    pub balance: Decimal,
    pub notes: Option<String>,
    pub user_id: i64,
}
