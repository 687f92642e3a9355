//! Shared utilities
//!
//! Error handling, validation, JWT, cookies and the business calendar.

pub mod calendar;
pub mod cookies;
pub mod errors;
pub mod extract;
pub mod jwt;
pub mod request;
pub mod validation;
