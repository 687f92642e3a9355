pub mod auth_routes;
pub mod logs_routes;
pub mod notification_routes;
pub mod stock_routes;
pub mod user_routes;

use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::{client_addr_middleware, cors_layer, rate_limit_middleware};
use crate::state::AppState;
use crate::utils::request::ProxyPolicy;

/// Full application router; serve it with `ConnectInfo<SocketAddr>` so client addresses resolve
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .nest("/auth", auth_routes::create_auth_router(state.clone()))
        .nest("/stock", stock_routes::create_stock_router(state.clone()))
        .nest("/users", user_routes::create_user_router(state.clone()))
        .nest("/notifications", notification_routes::create_notification_router(state.clone()))
        .nest("/logs", logs_routes::create_logs_router(state.clone()))
        .layer(from_fn_with_state(state.rate_limit.clone(), rate_limit_middleware))
        .layer(from_fn_with_state(ProxyPolicy::from(&state.config), client_addr_middleware))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "BBM monitoring API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
