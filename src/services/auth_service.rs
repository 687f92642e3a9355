//! Authentication service
//!
//! Password login, public registration and refresh token rotation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::config::environment::EnvironmentConfig;
use crate::models::user::{User, UserRole};
use crate::repositories::refresh_token_repository::RefreshTokenRepository;
use crate::repositories::user_repository::{NewUser, UserRepository};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::jwt::{generate_token, JwtConfig};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Random bytes in a refresh token
const REFRESH_TOKEN_BYTES: usize = 48;

/// Tokens handed to a client after login or refresh
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    users: UserRepository,
    tokens: RefreshTokenRepository,
    jwt: JwtConfig,
    refresh_token_days: i64,
}

impl AuthService {
    pub fn new(pool: PgPool, config: &EnvironmentConfig) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            tokens: RefreshTokenRepository::new(pool),
            jwt: JwtConfig::from(config),
            refresh_token_days: config.refresh_token_days,
        }
    }

    /// Checks credentials and opens a session
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> AppResult<Session> {
        let user = self
            .users
            .find_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        if !user.is_active {
            return Err(AppError::Unauthorized("Account is deactivated".to_string()));
        }

        if let Err(e) = self.tokens.delete_expired_for_user(user.id).await {
            warn!(user_id = user.id, error = %e, "failed to prune expired refresh tokens");
        }

        let session = self.open_session(user).await?;
        info!(user_id = session.user.id, "user logged in");
        Ok(session)
    }

    /// Creates an operational account with no assigned location
    pub async fn register(&self, email: &str, password: &str, name: &str) -> AppResult<User> {
        let password_hash = hash_password(password).await?;

        let user = self
            .users
            .create(NewUser {
                email: email.trim().to_lowercase(),
                password_hash,
                name: name.trim().to_string(),
                role: UserRole::Operational.code(),
                location: None,
            })
            .await?;

        info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Consumes `presented` and issues a new token pair; a token can be used once
    #[instrument(skip_all)]
    pub async fn refresh(&self, presented: &str) -> AppResult<Session> {
        let stored = self
            .tokens
            .consume(presented)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;

        if stored.is_expired() {
            return Err(AppError::Unauthorized("Invalid or expired refresh token".to_string()));
        }

        let user = self
            .users
            .find_by_id(stored.user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| AppError::Unauthorized("User not found or inactive".to_string()))?;

        self.open_session(user).await
    }

    pub async fn logout(&self, presented: &str) -> AppResult<()> {
        self.tokens.delete(presented).await
    }

    pub async fn current_user(&self, user_id: i64) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn open_session(&self, user: User) -> AppResult<Session> {
        let access_token = generate_token(&user, &self.jwt)?;
        let refresh_token = generate_refresh_token();
        let expires_at = Utc::now() + Duration::days(self.refresh_token_days);

        self.tokens.create(user.id, &refresh_token, expires_at).await?;

        Ok(Session {
            user,
            access_token,
            refresh_token,
        })
    }
}

/// Opaque URL-safe refresh token
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// bcrypt hash, computed off the async workers
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| AppError::Hash(e.to_string()))
}

pub async fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();
    tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| AppError::Hash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_tokens_are_unique_and_url_safe() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[tokio::test]
    async fn passwords_verify_against_their_hash() {
        let hashed = hash_password("solar-2026").await.unwrap();
        assert!(verify_password("solar-2026", &hashed).await.unwrap());
        assert!(!verify_password("solar-2025", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hashes_are_hash_errors() {
        let result = verify_password("x", "not-a-bcrypt-hash").await;
        assert!(matches!(result, Err(AppError::Hash(_))));
    }
}
