use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::User;
use crate::utils::validation::validate_not_blank;

// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

// Public registration; role and location are never taken from the body
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub name: String,
}

/// Public view of a user
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: i16,
    pub location: Option<i16>,
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            location: user.location,
        }
    }
}

// Login / refresh response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserData,
    pub token: String,
}

// Register / me response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_short_passwords_and_bad_emails() {
        let request = RegisterRequest {
            email: "not-an-email".into(),
            password: "123".into(),
            name: "Andi".into(),
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("name"));
    }

    #[test]
    fn blank_names_are_rejected() {
        let request = RegisterRequest {
            email: "andi@bosowa.co.id".into(),
            password: "secret123".into(),
            name: "   ".into(),
        };
        assert!(request.validate().unwrap_err().field_errors().contains_key("name"));
    }
}
