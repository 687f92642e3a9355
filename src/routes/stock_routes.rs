use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};

use crate::controllers::stock_controller::StockController;
use crate::dto::common_dto::Paginated;
use crate::dto::stock_dto::{
    BalanceSummary, LocationQuery, StockHistoryQuery, StockInRequest, StockOutRequest, StockTrendQuery,
    TodayStats, TrendPoint,
};
use crate::middleware::auth::{auth_middleware, optional_auth_middleware, require_admin, AuthenticatedUser};
use crate::models::stock::{StockHistoryRow, StockMovement};
use crate::services::export_service::XLSX_CONTENT_TYPE;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::{AppJson, AppQuery};
use crate::utils::request::ClientInfo;

pub fn create_stock_router(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/in", post(stock_in))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let authenticated = Router::new()
        .route("/summary", get(summary))
        .route("/out", post(stock_out))
        .route("/history", get(history))
        .route("/today", get(today))
        .route("/export", get(export))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let public = Router::new()
        .route("/trend", get(trend))
        .route_layer(from_fn_with_state(state, optional_auth_middleware));

    admin.merge(authenticated).merge(public)
}

pub async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    AppQuery(query): AppQuery<LocationQuery>,
) -> Result<Json<Vec<BalanceSummary>>, AppError> {
    let controller = StockController::new(&state);
    Ok(Json(controller.summary(&user, query).await?))
}

pub async fn stock_in(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    AppJson(request): AppJson<StockInRequest>,
) -> Result<(StatusCode, Json<StockMovement>), AppError> {
    let controller = StockController::new(&state);
    let row = controller.stock_in(&user, &client, request).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn stock_out(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    AppJson(request): AppJson<StockOutRequest>,
) -> Result<(StatusCode, Json<Vec<StockMovement>>), AppError> {
    let controller = StockController::new(&state);
    let rows = controller.stock_out(&user, &client, request).await?;
    Ok((StatusCode::CREATED, Json(rows)))
}

pub async fn history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    AppQuery(query): AppQuery<StockHistoryQuery>,
) -> Result<Json<Paginated<StockHistoryRow>>, AppError> {
    let controller = StockController::new(&state);
    Ok(Json(controller.history(&user, query).await?))
}

pub async fn trend(
    State(state): State<AppState>,
    user: Option<Extension<AuthenticatedUser>>,
    AppQuery(query): AppQuery<StockTrendQuery>,
) -> Result<Json<Vec<TrendPoint>>, AppError> {
    let controller = StockController::new(&state);
    let user = user.map(|Extension(user)| user);
    Ok(Json(controller.trend(user.as_ref(), query).await?))
}

pub async fn today(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    AppQuery(query): AppQuery<LocationQuery>,
) -> Result<Json<Vec<TodayStats>>, AppError> {
    let controller = StockController::new(&state);
    Ok(Json(controller.today(&user, query).await?))
}

pub async fn export(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    AppQuery(query): AppQuery<StockHistoryQuery>,
) -> Result<Response, AppError> {
    let controller = StockController::new(&state);
    let file = controller.export(&user, query).await?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file.file_name))
        .map_err(|e| AppError::Internal(format!("invalid export file name: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}
