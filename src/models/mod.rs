//! Database models
//!
//! Row types for every table plus the ledger enums.

pub mod refresh_token;
pub mod settings;
pub mod stock;
pub mod system_log;
pub mod user;

pub use stock::{Location, NewMovement, StockMovement, StockType};
pub use user::{User, UserRole};
