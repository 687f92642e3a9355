//! User model
//!
//! Maps the `users` table. Role and location are stored as small integers
//! (role 1 = admin, 2 = operational; location 1 = GENSET, 2 = TUG_ASSIST,
//! NULL = both).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::stock::Location;

/// System roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Operational,
}

impl UserRole {
    pub fn code(&self) -> i16 {
        match self {
            UserRole::Admin => 1,
            UserRole::Operational => 2,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(UserRole::Admin),
            2 => Some(UserRole::Operational),
            _ => None,
        }
    }
}

/// User row
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: i16,
    pub location: Option<i16>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Option<UserRole> {
        UserRole::from_code(self.role)
    }

    pub fn assigned_location(&self) -> Option<Location> {
        self.location.and_then(Location::from_code)
    }
}
