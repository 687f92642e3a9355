//! Spreadsheet export of the ledger history

use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Workbook, XlsxError};

use crate::models::stock::StockHistoryRow;
use crate::utils::calendar::BusinessCalendar;
use crate::utils::errors::{AppError, AppResult};

/// Most rows a single export returns
pub const MAX_EXPORT_ROWS: i64 = 10_000;

pub const EXPORT_SHEET_NAME: &str = "Stock History";

pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADERS: [&str; 8] = ["No", "Date", "Type", "Location", "Amount (L)", "Balance (L)", "Notes", "User"];

/// Builds the workbook bytes for `rows`
pub fn build_history_workbook(rows: &[StockHistoryRow], calendar: &BusinessCalendar) -> AppResult<Vec<u8>> {
    write_workbook(rows, calendar).map_err(|e| AppError::Export(e.to_string()))
}

fn write_workbook(rows: &[StockHistoryRow], calendar: &BusinessCalendar) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXPORT_SHEET_NAME)?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let line = index as u32 + 1;
        let local_time = row.created_at.with_timezone(&calendar.offset());

        worksheet.write_number(line, 0, line as f64)?;
        worksheet.write_string(line, 1, local_time.format("%Y-%m-%d %H:%M:%S").to_string())?;
        worksheet.write_string(line, 2, row.stock_type.as_str())?;
        worksheet.write_string(line, 3, row.location.as_str())?;
        worksheet.write_number(line, 4, row.amount.to_f64().unwrap_or_default())?;
        worksheet.write_number(line, 5, row.balance.to_f64().unwrap_or_default())?;
        worksheet.write_string(line, 6, row.notes.as_deref().unwrap_or(""))?;
        worksheet.write_string(line, 7, row.user_name.as_deref().unwrap_or(""))?;
    }

    workbook.save_to_buffer()
}

/// `stock-history-YYYYMMDD.xlsx` for the local date of `now`
pub fn export_file_name(calendar: &BusinessCalendar, now: chrono::DateTime<chrono::Utc>) -> String {
    format!("stock-history-{}.xlsx", calendar.local_date(now).format("%Y%m%d"))
}
