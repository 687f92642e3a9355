//! HTTP middleware
//!
//! Authentication, client address resolution, CORS and rate limiting.

pub mod auth;
pub mod client_addr;
pub mod cors;
pub mod rate_limit;

pub use auth::{auth_middleware, optional_auth_middleware, require_admin, AuthenticatedUser};
pub use client_addr::client_addr_middleware;
pub use cors::cors_layer;
pub use rate_limit::{rate_limit_middleware, RateLimitState};
