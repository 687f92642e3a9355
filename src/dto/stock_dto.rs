use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::stock::{Location, StockType};

// Request for a stock IN (admin)
#[derive(Debug, Deserialize, Validate)]
pub struct StockInRequest {
    pub amount: Decimal,
    pub location: Location,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

// Request for a stock OUT; allocation across locations is decided server side
#[derive(Debug, Deserialize, Validate)]
pub struct StockOutRequest {
    pub amount: Decimal,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

// Query for the ledger history and the export
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockHistoryQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "type")]
    pub stock_type: Option<StockType>,
    pub location: Option<Location>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StockTrendQuery {
    pub days: Option<u32>,
    pub location: Option<Location>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    pub location: Option<Location>,
}

// Current balance of one location
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BalanceSummary {
    pub location: Location,
    pub balance: Decimal,
}

// Today's figures for one location
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    pub location: Location,
    pub initial_stock: Decimal,
    pub today_in: Decimal,
    pub today_out: Decimal,
    pub final_stock: Decimal,
}

// Closing balance of one location on one day
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub location: Location,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LowStockAlert {
    pub location: Location,
    pub balance: Decimal,
    pub threshold: Decimal,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LowStockReport {
    pub has_alerts: bool,
    pub alerts: Vec<LowStockAlert>,
    pub threshold: Decimal,
}
