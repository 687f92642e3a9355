use serde::{Deserialize, Serialize};

use crate::models::system_log::{ActionCount, UserActivity};

/// Default page size for the audit listing
pub const DEFAULT_LOGS_PAGE_SIZE: i64 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub user_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub search: Option<String>,
}

// Activity over the last 30 days
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsStats {
    pub total_logs: i64,
    pub action_counts: Vec<ActionCount>,
    pub user_activity: Vec<UserActivity>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanLogsResponse {
    pub message: String,
    pub deleted_count: u64,
}
