use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::models::user::User;
use crate::utils::validation::validate_not_blank;

// Admin user creation
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub name: String,
    #[validate(range(min = 1, max = 2))]
    pub role: Option<i16>,
    #[validate(range(min = 1, max = 2))]
    pub location: Option<i16>,
}

// Admin user update; absent fields are left alone
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 128))]
    pub password: Option<String>,
    #[validate(length(min = 1, max = 255), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 2))]
    pub role: Option<i16>,
    /// `null` clears the location, a missing field keeps it
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<i16>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

/// User as listed to admins
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: i16,
    pub location: Option<i16>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            location: user.location,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i16>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i16>::deserialize(deserializer).map(Some)
}
