use std::collections::BTreeMap;

use axum::{
    extract::State,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Extension, Json, Router,
};

use crate::controllers::notification_controller::NotificationController;
use crate::dto::notification_dto::{UpdateSettingRequest, UpdateSettingResponse};
use crate::dto::stock_dto::LowStockReport;
use crate::middleware::auth::{auth_middleware, require_admin, AuthenticatedUser};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::AppJson;
use crate::utils::request::ClientInfo;

pub fn create_notification_router(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/settings", get(get_settings).post(update_setting))
        .route_layer(from_fn(require_admin));

    Router::new()
        .route("/check", get(check_low_stock))
        .merge(admin)
        .route_layer(from_fn_with_state(state, auth_middleware))
}

pub async fn check_low_stock(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<LowStockReport>, AppError> {
    let controller = NotificationController::new(&state);
    Ok(Json(controller.check(&user).await?))
}

pub async fn get_settings(State(state): State<AppState>) -> Result<Json<BTreeMap<String, String>>, AppError> {
    let controller = NotificationController::new(&state);
    Ok(Json(controller.settings().await?))
}

pub async fn update_setting(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedUser>,
    client: ClientInfo,
    AppJson(request): AppJson<UpdateSettingRequest>,
) -> Result<Json<UpdateSettingResponse>, AppError> {
    let controller = NotificationController::new(&state);
    Ok(Json(controller.update_setting(&admin, &client, request).await?))
}
