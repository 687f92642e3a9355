use axum::{
    extract::State,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch},
    Extension, Json, Router,
};

use crate::controllers::user_controller::UserController;
use crate::dto::common_dto::{MessageResponse, Paginated};
use crate::dto::user_dto::{CreateUserRequest, UpdateUserRequest, UserListQuery, UserSummary};
use crate::middleware::auth::{auth_middleware, require_admin, AuthenticatedUser};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::{AppJson, AppPath, AppQuery};
use crate::utils::request::ClientInfo;

/// `/users`, admin only
pub fn create_user_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/toggle-status", patch(toggle_user_status))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state, auth_middleware))
}

pub async fn list_users(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> Result<Json<Paginated<UserSummary>>, AppError> {
    let controller = UserController::new(&state);
    Ok(Json(controller.list(query).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<UserSummary>, AppError> {
    let controller = UserController::new(&state);
    Ok(Json(controller.get(id).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedUser>,
    client: ClientInfo,
    AppJson(request): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserSummary>), AppError> {
    let controller = UserController::new(&state);
    let user = controller.create(&admin, &client, request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedUser>,
    client: ClientInfo,
    AppPath(id): AppPath<i64>,
    AppJson(request): AppJson<UpdateUserRequest>,
) -> Result<Json<UserSummary>, AppError> {
    let controller = UserController::new(&state);
    Ok(Json(controller.update(&admin, &client, id, request).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedUser>,
    client: ClientInfo,
    AppPath(id): AppPath<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let controller = UserController::new(&state);
    Ok(Json(controller.delete(&admin, &client, id).await?))
}

pub async fn toggle_user_status(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedUser>,
    client: ClientInfo,
    AppPath(id): AppPath<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let controller = UserController::new(&state);
    Ok(Json(controller.toggle_status(&admin, &client, id).await?))
}
