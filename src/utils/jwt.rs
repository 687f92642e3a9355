//! JWT utilities
//!
//! Access token signing and verification (HS256).

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{config::environment::EnvironmentConfig, models::user::User, utils::errors::AppError};

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JwtClaims {
    pub sub: String, // user id
    pub email: String,
    pub role: i16,
    pub location: Option<i16>,
    pub exp: usize,
    pub iat: usize,
}

impl JwtClaims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))
    }
}

/// JWT settings
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Lifetime in seconds
    pub expiration: u64,
}

impl From<&EnvironmentConfig> for JwtConfig {
    fn from(config: &EnvironmentConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration: config.jwt_expiration,
        }
    }
}

/// Issues an access token for `user`
pub fn generate_token(user: &User, config: &JwtConfig) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expires_at = now + chrono::Duration::seconds(config.expiration as i64);

    let claims = JwtClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role,
        location: user.location,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let encoding_key = EncodingKey::from_secret(config.secret.as_ref());

    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| AppError::Jwt(format!("Failed to sign token: {}", e)))
}

/// Verifies signature and expiry, returning the claims
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<JwtClaims, AppError> {
    let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

    let token_data = decode::<JwtClaims>(token, &decoding_key, &Validation::default())
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

    Ok(token_data.claims)
}

/// Pulls the token out of an `Authorization: Bearer ...` header value
pub fn extract_token_from_header(auth_header: &str) -> Result<&str, AppError> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Authorization header must use the Bearer scheme".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AppError::Unauthorized("Token cannot be empty".to_string()));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn operator() -> User {
        User {
            id: 42,
            email: "operator@bosowa.co.id".into(),
            password_hash: String::new(),
            name: "Operator".into(),
            role: 2,
            location: Some(2),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            expiration: 600,
        }
    }

    #[test]
    fn issued_tokens_verify_with_the_same_claims() {
        let token = generate_token(&operator(), &config()).unwrap();
        let claims = verify_token(&token, &config()).unwrap();

        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.role, 2);
        assert_eq!(claims.location, Some(2));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let token = generate_token(&operator(), &config()).unwrap();
        let other = JwtConfig {
            secret: "other".into(),
            expiration: 600,
        };
        assert!(matches!(verify_token(&token, &other), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(extract_token_from_header("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(extract_token_from_header("Basic abc").is_err());
        assert!(extract_token_from_header("Bearer   ").is_err());
    }
}
