//! Audit log model

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Audit action names
pub mod actions {
    pub const LOGIN: &str = "LOGIN";
    pub const LOGOUT: &str = "LOGOUT";
    pub const LOGIN_FAILED: &str = "LOGIN_FAILED";
    pub const TOKEN_REFRESH: &str = "TOKEN_REFRESH";
    pub const STOCK_IN: &str = "STOCK_IN";
    pub const STOCK_OUT: &str = "STOCK_OUT";
    pub const USER_CREATED: &str = "USER_CREATED";
    pub const USER_UPDATED: &str = "USER_UPDATED";
    pub const USER_DELETED: &str = "USER_DELETED";
    pub const SETTINGS_UPDATED: &str = "SETTINGS_UPDATED";
    pub const LOGS_VIEWED: &str = "LOGS_VIEWED";
}

/// Audit row joined with the acting user
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SystemLogRow {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub ip_address: Option<String>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// Audit entry to be written
#[derive(Debug, Clone, Default)]
pub struct NewSystemLog {
    pub user_id: Option<i64>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub details: Option<String>,
}

impl NewSystemLog {
    pub fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
            ..Default::default()
        }
    }

    pub fn user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn entity(mut self, entity_type: &str, entity_id: Option<i64>) -> Self {
        self.entity_type = Some(entity_type.to_string());
        self.entity_id = entity_id;
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Client address and user agent of the request being audited
    pub fn client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}

/// Number of entries per action
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct ActionCount {
    pub action: String,
    pub count: i64,
}

/// Number of entries per acting user
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub user_id: i64,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub count: i64,
}
