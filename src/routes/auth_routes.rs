use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};

use crate::controllers::auth_controller::{AuthController, IssuedSession};
use crate::dto::auth_dto::{LoginRequest, RegisterRequest, UserResponse};
use crate::dto::common_dto::MessageResponse;
use crate::middleware::auth::{auth_middleware, AuthenticatedUser};
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::state::AppState;
use crate::utils::cookies::{clear_refresh_cookie, refresh_cookie, refresh_token_from_headers};
use crate::utils::errors::AppError;
use crate::utils::extract::AppJson;
use crate::utils::request::ClientInfo;

/// `/auth` routes; credential endpoints share a stricter per-IP limit
pub fn create_auth_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/refresh", post(refresh))
        .route_layer(from_fn_with_state(state.auth_rate_limit.clone(), rate_limit_middleware));

    let authenticated = Router::new()
        .route("/me", get(me))
        .route("/logout", post(logout))
        .route_layer(from_fn_with_state(state, auth_middleware));

    public.merge(authenticated)
}

fn session_response(state: &AppState, session: IssuedSession) -> Result<Response, AppError> {
    let cookie = refresh_cookie(
        &session.refresh_token,
        state.config.refresh_token_days,
        state.config.is_production(),
    )?;

    Ok(([(header::SET_COOKIE, cookie)], Json(session.response)).into_response())
}

pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Response, AppError> {
    let controller = AuthController::new(&state);
    let session = controller.login(&client, request).await?;
    session_response(&state, session)
}

pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let controller = AuthController::new(&state);
    let response = controller.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn refresh(
    State(state): State<AppState>,
    client: ClientInfo,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let controller = AuthController::new(&state);
    let session = controller
        .refresh(&client, refresh_token_from_headers(&headers))
        .await?;
    session_response(&state, session)
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<UserResponse>, AppError> {
    let controller = AuthController::new(&state);
    Ok(Json(controller.me(user.user_id).await?))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let controller = AuthController::new(&state);
    controller
        .logout(&client, user.user_id, refresh_token_from_headers(&headers))
        .await?;

    let cookie = clear_refresh_cookie(state.config.is_production())?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse::new("Logged out successfully")),
    )
        .into_response())
}
