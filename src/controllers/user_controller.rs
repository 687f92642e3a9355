use validator::Validate;

use crate::dto::common_dto::{MessageResponse, PageRequest, Paginated, DEFAULT_PAGE_SIZE};
use crate::dto::user_dto::{CreateUserRequest, UpdateUserRequest, UserListQuery, UserSummary};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::stock::Location;
use crate::models::system_log::{actions, NewSystemLog};
use crate::models::user::UserRole;
use crate::repositories::refresh_token_repository::RefreshTokenRepository;
use crate::repositories::user_repository::{NewUser, UserChanges, UserRepository};
use crate::services::auth_service::hash_password;
use crate::services::AuditService;
use crate::state::AppState;
use crate::utils::errors::{validation_error, AppError};
use crate::utils::request::ClientInfo;

pub struct UserController {
    repository: UserRepository,
    tokens: RefreshTokenRepository,
    audit: AuditService,
}

impl UserController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: UserRepository::new(state.pool.clone()),
            tokens: RefreshTokenRepository::new(state.pool.clone()),
            audit: state.audit.clone(),
        }
    }

    pub async fn list(&self, query: UserListQuery) -> Result<Paginated<UserSummary>, AppError> {
        let page = PageRequest::parse(query.page.as_deref(), query.limit.as_deref(), DEFAULT_PAGE_SIZE);
        let search = query.search.as_deref();

        let total = self.repository.count(search).await?;
        let users = self.repository.list(search, page.limit, page.offset()).await?;

        Ok(Paginated {
            data: users.into_iter().map(UserSummary::from).collect(),
            pagination: page.meta(total),
        })
    }

    pub async fn get(&self, id: i64) -> Result<UserSummary, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .map(UserSummary::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn create(
        &self,
        admin: &AuthenticatedUser,
        client: &ClientInfo,
        request: CreateUserRequest,
    ) -> Result<UserSummary, AppError> {
        request.validate()?;

        let user = self
            .repository
            .create(NewUser {
                email: request.email.trim().to_lowercase(),
                password_hash: hash_password(&request.password).await?,
                name: request.name.trim().to_string(),
                role: request.role.unwrap_or(UserRole::Operational.code()),
                location: request.location,
            })
            .await?;

        self.audit.record_request(
            client,
            NewSystemLog::new(actions::USER_CREATED)
                .user(admin.user_id)
                .entity("user", Some(user.id))
                .details(format!("Created user {}", user.email)),
        );

        Ok(user.into())
    }

    pub async fn update(
        &self,
        admin: &AuthenticatedUser,
        client: &ClientInfo,
        id: i64,
        request: UpdateUserRequest,
    ) -> Result<UserSummary, AppError> {
        request.validate()?;

        if let Some(Some(code)) = request.location {
            if Location::from_code(code).is_none() {
                return Err(validation_error("location", "range", "Unknown location code"));
            }
        }
        if admin.user_id == id && request.is_active == Some(false) {
            return Err(AppError::BadRequest("You cannot deactivate your own account".to_string()));
        }

        let password_hash = match request.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };
        let password_changed = password_hash.is_some();

        let changes = UserChanges {
            email: request.email.map(|email| email.trim().to_lowercase()),
            password_hash,
            name: request.name.map(|name| name.trim().to_string()),
            role: request.role,
            location: request.location,
            is_active: request.is_active,
        };

        let user = self
            .repository
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if password_changed || !user.is_active {
            self.tokens.delete_for_user(user.id).await?;
        }

        self.audit.record_request(
            client,
            NewSystemLog::new(actions::USER_UPDATED)
                .user(admin.user_id)
                .entity("user", Some(user.id))
                .details(format!("Updated user {}", user.email)),
        );

        Ok(user.into())
    }

    pub async fn delete(
        &self,
        admin: &AuthenticatedUser,
        client: &ClientInfo,
        id: i64,
    ) -> Result<MessageResponse, AppError> {
        if admin.user_id == id {
            return Err(AppError::BadRequest("You cannot delete your own account".to_string()));
        }

        if !self.repository.delete(id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.audit.record_request(
            client,
            NewSystemLog::new(actions::USER_DELETED)
                .user(admin.user_id)
                .entity("user", Some(id)),
        );

        Ok(MessageResponse::new("User deleted successfully"))
    }

    pub async fn toggle_status(
        &self,
        admin: &AuthenticatedUser,
        client: &ClientInfo,
        id: i64,
    ) -> Result<MessageResponse, AppError> {
        if admin.user_id == id {
            return Err(AppError::BadRequest("You cannot deactivate your own account".to_string()));
        }

        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let changes = UserChanges {
            is_active: Some(!current.is_active),
            ..Default::default()
        };
        let user = self
            .repository
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !user.is_active {
            self.tokens.delete_for_user(user.id).await?;
        }

        let verb = if user.is_active { "activated" } else { "deactivated" };
        self.audit.record_request(
            client,
            NewSystemLog::new(actions::USER_UPDATED)
                .user(admin.user_id)
                .entity("user", Some(user.id))
                .details(format!("User {} {}", user.email, verb)),
        );

        Ok(MessageResponse::new(format!("User {} successfully", verb)))
    }
}
