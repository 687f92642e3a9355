//! JWT authentication middleware
//!
//! Verifies the bearer token, re-checks that the user still exists and is
//! active, and injects an [`AuthenticatedUser`] into the request extensions.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    Extension,
};

use crate::{
    models::{
        stock::Location,
        user::{User, UserRole},
    },
    repositories::user_repository::UserRepository,
    state::AppState,
    utils::{
        errors::{AppError, AppResult},
        jwt::{extract_token_from_header, verify_token},
    },
};

/// Caller identity resolved from the access token
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
    /// Assigned location; `None` means both
    pub location: Option<Location>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Location filter for a read query.
    ///
    /// Admins and unassigned users get what they asked for. An assigned user
    /// is pinned to their location and may not ask for another one.
    pub fn scope(&self, requested: Option<Location>) -> AppResult<Option<Location>> {
        match (self.is_admin(), self.location, requested) {
            (true, _, requested) | (false, None, requested) => Ok(requested),
            (false, Some(assigned), Some(requested)) if requested != assigned => Err(AppError::Forbidden(
                format!("Access to {} is not allowed for this account", requested),
            )),
            (false, Some(assigned), _) => Ok(Some(assigned)),
        }
    }

    /// Locations a per-location report should cover
    pub fn scoped_locations(&self, requested: Option<Location>) -> AppResult<Vec<Location>> {
        Ok(locations_for(self.scope(requested)?))
    }
}

impl TryFrom<&User> for AuthenticatedUser {
    type Error = AppError;

    fn try_from(user: &User) -> Result<Self, Self::Error> {
        let role = user
            .role()
            .ok_or_else(|| AppError::Unauthorized("Account has an unknown role".to_string()))?;

        Ok(Self {
            user_id: user.id,
            email: user.email.clone(),
            role,
            location: user.assigned_location(),
        })
    }
}

/// One location, or every location when unfiltered
pub fn locations_for(location: Option<Location>) -> Vec<Location> {
    match location {
        Some(location) => vec![location],
        None => Location::ALL.to_vec(),
    }
}

async fn resolve_user(state: &AppState, token: &str) -> AppResult<AuthenticatedUser> {
    let claims = verify_token(token, &state.jwt)?;

    let user = UserRepository::new(state.pool.clone())
        .find_by_id(claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if !user.is_active {
        return Err(AppError::Unauthorized("Account is deactivated".to_string()));
    }

    AuthenticatedUser::try_from(&user)
}

/// Rejects requests without a valid token
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let user = resolve_user(&state, token).await?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Injects the user when a valid token is present; never rejects
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| extract_token_from_header(value).ok())
        .map(str::to_string);

    if let Some(token) = token {
        if let Ok(user) = resolve_user(&state, &token).await {
            request.extensions_mut().insert(user);
        }
    }

    next.run(request).await
}

/// Admin-only routes; must run after [`auth_middleware`]
pub async fn require_admin(
    Extension(user): Extension<AuthenticatedUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Administrator privileges required".to_string()));
    }

    Ok(next.run(request).await)
}
