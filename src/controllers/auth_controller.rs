use validator::Validate;

use crate::dto::auth_dto::{AuthResponse, LoginRequest, RegisterRequest, UserData, UserResponse};
use crate::models::system_log::{actions, NewSystemLog};
use crate::services::auth_service::Session;
use crate::services::{AuditService, AuthService};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::request::ClientInfo;

/// Login or refresh outcome: the JSON body plus the refresh token for the cookie
pub struct IssuedSession {
    pub response: AuthResponse,
    pub refresh_token: String,
}

impl From<Session> for IssuedSession {
    fn from(session: Session) -> Self {
        Self {
            response: AuthResponse {
                user: UserData::from(&session.user),
                token: session.access_token,
            },
            refresh_token: session.refresh_token,
        }
    }
}

pub struct AuthController {
    service: AuthService,
    audit: AuditService,
}

impl AuthController {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: AuthService::new(state.pool.clone(), &state.config),
            audit: state.audit.clone(),
        }
    }

    pub async fn login(&self, client: &ClientInfo, request: LoginRequest) -> Result<IssuedSession, AppError> {
        request.validate()?;

        match self.service.login(&request.email, &request.password).await {
            Ok(session) => {
                self.audit.record_request(
                    client,
                    NewSystemLog::new(actions::LOGIN)
                        .user(session.user.id)
                        .entity("user", Some(session.user.id))
                        .details(format!("User {} logged in", session.user.email)),
                );
                Ok(session.into())
            }
            Err(e) => {
                if matches!(e, AppError::Unauthorized(_)) {
                    self.audit.record_request(
                        client,
                        NewSystemLog::new(actions::LOGIN_FAILED)
                            .details(format!("Failed login for {}", request.email.trim())),
                    );
                }
                Err(e)
            }
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AppError> {
        request.validate()?;

        let user = self
            .service
            .register(&request.email, &request.password, &request.name)
            .await?;

        Ok(UserResponse {
            user: UserData::from(&user),
        })
    }

    pub async fn refresh(&self, client: &ClientInfo, presented: Option<String>) -> Result<IssuedSession, AppError> {
        let presented =
            presented.ok_or_else(|| AppError::Unauthorized("No refresh token provided".to_string()))?;

        let session = self.service.refresh(&presented).await?;
        self.audit.record_request(
            client,
            NewSystemLog::new(actions::TOKEN_REFRESH)
                .user(session.user.id)
                .entity("user", Some(session.user.id)),
        );

        Ok(session.into())
    }

    pub async fn me(&self, user_id: i64) -> Result<UserResponse, AppError> {
        let user = self.service.current_user(user_id).await?;
        Ok(UserResponse {
            user: UserData::from(&user),
        })
    }

    pub async fn logout(&self, client: &ClientInfo, user_id: i64, presented: Option<String>) -> Result<(), AppError> {
        if let Some(token) = presented {
            self.service.logout(&token).await?;
        }

        self.audit.record_request(
            client,
            NewSystemLog::new(actions::LOGOUT)
                .user(user_id)
                .entity("user", Some(user_id)),
        );

        Ok(())
    }
}
