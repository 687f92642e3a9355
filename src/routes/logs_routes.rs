use axum::{
    extract::State,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get},
    Extension, Json, Router,
};

use crate::controllers::logs_controller::LogsController;
use crate::dto::common_dto::Paginated;
use crate::dto::logs_dto::{CleanLogsResponse, LogsQuery, LogsStats};
use crate::middleware::auth::{auth_middleware, require_admin, AuthenticatedUser};
use crate::models::system_log::SystemLogRow;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::AppQuery;
use crate::utils::request::ClientInfo;

/// `/logs`, admin only
pub fn create_logs_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_logs))
        .route("/stats", get(logs_stats))
        .route("/clean", delete(clean_logs))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state, auth_middleware))
}

pub async fn list_logs(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedUser>,
    client: ClientInfo,
    AppQuery(query): AppQuery<LogsQuery>,
) -> Result<Json<Paginated<SystemLogRow>>, AppError> {
    let controller = LogsController::new(&state);
    Ok(Json(controller.list(&admin, &client, query).await?))
}

pub async fn logs_stats(State(state): State<AppState>) -> Result<Json<LogsStats>, AppError> {
    let controller = LogsController::new(&state);
    Ok(Json(controller.stats().await?))
}

pub async fn clean_logs(State(state): State<AppState>) -> Result<Json<CleanLogsResponse>, AppError> {
    let controller = LogsController::new(&state);
    Ok(Json(controller.clean().await?))
}
