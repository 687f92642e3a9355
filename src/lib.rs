//! BBM fuel stock monitoring API
//!
//! Append-only ledger of fuel movements for the GENSET and TUG_ASSIST
//! locations, with role-gated reporting, JWT authentication and an audit trail.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
pub use state::AppState;
