//! Business logic
//!
//! The stock ledger and its reports, authentication, auditing and export.

pub mod audit_service;
pub mod auth_service;
pub mod export_service;
pub mod ledger;
pub mod memory_ledger;
pub mod stock_service;

pub use audit_service::AuditService;
pub use auth_service::AuthService;
pub use ledger::StockLedger;
pub use stock_service::StockService;
