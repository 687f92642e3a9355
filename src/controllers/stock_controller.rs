use chrono::Utc;
use validator::Validate;

use crate::dto::common_dto::{PageRequest, Paginated, DEFAULT_PAGE_SIZE};
use crate::dto::stock_dto::{
    BalanceSummary, LocationQuery, LowStockReport, StockHistoryQuery, StockInRequest, StockOutRequest,
    StockTrendQuery, TodayStats, TrendPoint,
};
use crate::middleware::auth::{locations_for, AuthenticatedUser};
use crate::models::stock::{StockHistoryRow, StockMovement};
use crate::models::system_log::{actions, NewSystemLog};
use crate::repositories::settings_repository::SettingsRepository;
use crate::repositories::stock_repository::{HistoryFilter, StockRepository};
use crate::services::export_service::{self, MAX_EXPORT_ROWS};
use crate::services::{AuditService, StockService};
use crate::state::AppState;
use crate::utils::calendar::BusinessCalendar;
use crate::utils::errors::AppError;
use crate::utils::request::ClientInfo;
use crate::utils::validation::{require_date_bound, DateBound};

/// Spreadsheet ready to be sent
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct StockController {
    service: StockService,
    repository: StockRepository,
    settings: SettingsRepository,
    audit: AuditService,
    calendar: BusinessCalendar,
}

impl StockController {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: state.stock_service.clone(),
            repository: StockRepository::new(state.pool.clone()),
            settings: SettingsRepository::new(state.pool.clone()),
            audit: state.audit.clone(),
            calendar: state.calendar,
        }
    }

    pub async fn summary(
        &self,
        user: &AuthenticatedUser,
        query: LocationQuery,
    ) -> Result<Vec<BalanceSummary>, AppError> {
        let locations = user.scoped_locations(query.location)?;
        self.service.summary(&locations).await
    }

    pub async fn stock_in(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        request: StockInRequest,
    ) -> Result<StockMovement, AppError> {
        request.validate()?;

        let row = self
            .service
            .record_in(request.location, request.amount, request.notes, user.user_id)
            .await?;

        self.audit.record_request(
            client,
            NewSystemLog::new(actions::STOCK_IN)
                .user(user.user_id)
                .entity("stock", Some(row.id))
                .details(format!("IN {} L at {} (balance {} L)", row.amount, row.location, row.balance)),
        );

        Ok(row)
    }

    pub async fn stock_out(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        request: StockOutRequest,
    ) -> Result<Vec<StockMovement>, AppError> {
        request.validate()?;

        let rows = self
            .service
            .record_out(request.amount, request.notes, user.user_id)
            .await?;

        let allocation = rows
            .iter()
            .map(|row| format!("{} {} L", row.location, row.amount))
            .collect::<Vec<_>>()
            .join(", ");
        self.audit.record_request(
            client,
            NewSystemLog::new(actions::STOCK_OUT)
                .user(user.user_id)
                .entity("stock", rows.first().map(|row| row.id))
                .details(format!("OUT {} L ({})", request.amount, allocation)),
        );

        Ok(rows)
    }

    pub async fn history(
        &self,
        user: &AuthenticatedUser,
        query: StockHistoryQuery,
    ) -> Result<Paginated<StockHistoryRow>, AppError> {
        let page = PageRequest::parse(query.page.as_deref(), query.limit.as_deref(), DEFAULT_PAGE_SIZE);
        let filter = self.history_filter(user, &query)?;

        let total = self.repository.count_history(&filter).await?;
        let data = self.repository.find_history(&filter, page.limit, page.offset()).await?;

        Ok(Paginated {
            data,
            pagination: page.meta(total),
        })
    }

    pub async fn trend(
        &self,
        user: Option<&AuthenticatedUser>,
        query: StockTrendQuery,
    ) -> Result<Vec<TrendPoint>, AppError> {
        let location = match user {
            Some(user) => user.scope(query.location)?,
            None => query.location,
        };
        self.service.trend(query.days, &locations_for(location)).await
    }

    pub async fn today(
        &self,
        user: &AuthenticatedUser,
        query: LocationQuery,
    ) -> Result<Vec<TodayStats>, AppError> {
        let locations = user.scoped_locations(query.location)?;
        self.service.today_stats(&locations).await
    }

    pub async fn low_stock(&self, user: &AuthenticatedUser) -> Result<LowStockReport, AppError> {
        let locations = user.scoped_locations(None)?;
        let threshold = self.settings.low_stock_threshold().await?;
        self.service.low_stock_check(&locations, threshold).await
    }

    pub async fn export(
        &self,
        user: &AuthenticatedUser,
        query: StockHistoryQuery,
    ) -> Result<ExportFile, AppError> {
        let filter = self.history_filter(user, &query)?;
        let rows = self.repository.find_history(&filter, MAX_EXPORT_ROWS, 0).await?;

        let bytes = export_service::build_history_workbook(&rows, &self.calendar)?;
        Ok(ExportFile {
            file_name: export_service::export_file_name(&self.calendar, Utc::now()),
            bytes,
        })
    }

    fn history_filter(
        &self,
        user: &AuthenticatedUser,
        query: &StockHistoryQuery,
    ) -> Result<HistoryFilter, AppError> {
        Ok(HistoryFilter {
            stock_type: query.stock_type,
            location: user.scope(query.location)?,
            start: require_date_bound("startDate", query.start_date.as_deref(), DateBound::Start, &self.calendar)?,
            end: require_date_bound("endDate", query.end_date.as_deref(), DateBound::End, &self.calendar)?,
            search: query.search.clone(),
        })
    }
}
