//! Audit trail
//!
//! Entries are written in the background; a failed write is logged and never
//! reaches the request that triggered it.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{debug, warn};

use crate::models::system_log::NewSystemLog;
use crate::repositories::system_log_repository::SystemLogRepository;
use crate::utils::request::ClientInfo;

const MAX_ACTION_LEN: usize = 100;
const MAX_ENTITY_TYPE_LEN: usize = 50;
const MAX_IP_LEN: usize = 45;
const MAX_USER_AGENT_LEN: usize = 500;
const MAX_DETAILS_LEN: usize = 1000;

#[derive(Clone)]
pub struct AuditService {
    logs: Arc<SystemLogRepository>,
}

impl AuditService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            logs: Arc::new(SystemLogRepository::new(pool)),
        }
    }

    /// Queues `entry` for insertion
    pub fn record(&self, entry: NewSystemLog) {
        let entry = truncate_entry(entry);
        let logs = self.logs.clone();

        tokio::spawn(async move {
            match logs.insert(&entry).await {
                Ok(()) => debug!(action = %entry.action, user_id = ?entry.user_id, "audit entry written"),
                Err(e) => warn!(action = %entry.action, error = %e, "failed to write audit entry"),
            }
        });
    }

    /// Like [`record`](Self::record), attaching the caller's address and user agent
    pub fn record_request(&self, client: &ClientInfo, entry: NewSystemLog) {
        self.record(entry.client(client.ip.clone(), client.user_agent.clone()));
    }
}

fn truncate_entry(mut entry: NewSystemLog) -> NewSystemLog {
    entry.action = truncate_chars(&entry.action, MAX_ACTION_LEN);
    entry.entity_type = entry.entity_type.map(|v| truncate_chars(&v, MAX_ENTITY_TYPE_LEN));
    entry.ip_address = entry.ip_address.map(|v| truncate_chars(&v, MAX_IP_LEN));
    entry.user_agent = entry.user_agent.map(|v| truncate_chars(&v, MAX_USER_AGENT_LEN));
    entry.details = entry.details.map(|v| truncate_chars(&v, MAX_DETAILS_LEN));
    entry
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}
