use chrono::{Duration, Utc};

use crate::dto::common_dto::{PageRequest, Paginated};
use crate::dto::logs_dto::{CleanLogsResponse, LogsQuery, LogsStats, DEFAULT_LOGS_PAGE_SIZE};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::system_log::{actions, NewSystemLog, SystemLogRow};
use crate::repositories::system_log_repository::{LogFilter, SystemLogRepository};
use crate::services::AuditService;
use crate::state::AppState;
use crate::utils::calendar::BusinessCalendar;
use crate::utils::errors::{validation_error, AppError};
use crate::utils::request::ClientInfo;
use crate::utils::validation::{require_date_bound, DateBound};

/// Window covered by the statistics endpoint
const STATS_WINDOW_DAYS: i64 = 30;

/// Entries older than this are removed by the clean endpoint
const RETENTION_DAYS: i64 = 90;

const TOP_USERS: i64 = 5;

pub struct LogsController {
    repository: SystemLogRepository,
    audit: AuditService,
    calendar: BusinessCalendar,
}

impl LogsController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: SystemLogRepository::new(state.pool.clone()),
            audit: state.audit.clone(),
            calendar: state.calendar,
        }
    }

    pub async fn list(
        &self,
        admin: &AuthenticatedUser,
        client: &ClientInfo,
        query: LogsQuery,
    ) -> Result<Paginated<SystemLogRow>, AppError> {
        let page = PageRequest::parse(query.page.as_deref(), query.limit.as_deref(), DEFAULT_LOGS_PAGE_SIZE);

        let user_id = match query.user_id.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| validation_error("userId", "integer", "userId must be a number"))?,
            ),
            None => None,
        };

        let filter = LogFilter {
            action: query.action,
            entity_type: query.entity_type,
            user_id,
            start: require_date_bound("startDate", query.start_date.as_deref(), DateBound::Start, &self.calendar)?,
            end: require_date_bound("endDate", query.end_date.as_deref(), DateBound::End, &self.calendar)?,
            search: query.search,
        };

        let total = self.repository.count(&filter).await?;
        let data = self.repository.list(&filter, page.limit, page.offset()).await?;

        self.audit.record_request(
            client,
            NewSystemLog::new(actions::LOGS_VIEWED)
                .user(admin.user_id)
                .entity("system_logs", None)
                .details(format!("Viewed logs page {}", page.page)),
        );

        Ok(Paginated {
            data,
            pagination: page.meta(total),
        })
    }

    pub async fn stats(&self) -> Result<LogsStats, AppError> {
        let since = Utc::now() - Duration::days(STATS_WINDOW_DAYS);

        Ok(LogsStats {
            total_logs: self.repository.count_since(since).await?,
            action_counts: self.repository.counts_by_action(since).await?,
            user_activity: self.repository.top_users(since, TOP_USERS).await?,
        })
    }

    pub async fn clean(&self) -> Result<CleanLogsResponse, AppError> {
        let cutoff = Utc::now() - Duration::days(RETENTION_DAYS);
        let deleted_count = self.repository.delete_older_than(cutoff).await?;

        tracing::info!(deleted_count, "old audit entries removed");

        Ok(CleanLogsResponse {
            message: "Old logs cleaned successfully".to_string(),
            deleted_count,
        })
    }
}
