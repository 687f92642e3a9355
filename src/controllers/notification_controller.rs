use std::collections::BTreeMap;

use validator::Validate;

use crate::dto::notification_dto::{UpdateSettingRequest, UpdateSettingResponse};
use crate::dto::stock_dto::LowStockReport;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::system_log::{actions, NewSystemLog};
use crate::repositories::settings_repository::SettingsRepository;
use crate::services::{AuditService, StockService};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::request::ClientInfo;
use crate::utils::validation::parse_setting_value;

pub struct NotificationController {
    stock_service: StockService,
    settings: SettingsRepository,
    audit: AuditService,
}

impl NotificationController {
    pub fn new(state: &AppState) -> Self {
        Self {
            stock_service: state.stock_service.clone(),
            settings: SettingsRepository::new(state.pool.clone()),
            audit: state.audit.clone(),
        }
    }

    /// Low stock alerts for the locations the caller can see
    pub async fn check(&self, user: &AuthenticatedUser) -> Result<LowStockReport, AppError> {
        let locations = user.scoped_locations(None)?;
        let threshold = self.settings.low_stock_threshold().await?;
        self.stock_service.low_stock_check(&locations, threshold).await
    }

    pub async fn settings(&self) -> Result<BTreeMap<String, String>, AppError> {
        self.settings.all().await
    }

    pub async fn update_setting(
        &self,
        admin: &AuthenticatedUser,
        client: &ClientInfo,
        request: UpdateSettingRequest,
    ) -> Result<UpdateSettingResponse, AppError> {
        request.validate()?;

        let value = parse_setting_value(&request.key, &request.value)?;
        let setting = self.settings.upsert(&request.key, &value).await?;

        self.audit.record_request(
            client,
            NewSystemLog::new(actions::SETTINGS_UPDATED)
                .user(admin.user_id)
                .entity("settings", Some(setting.id))
                .details(format!("{} = {}", setting.key, setting.value)),
        );

        Ok(UpdateSettingResponse {
            message: "Setting updated successfully".to_string(),
            key: setting.key,
            value: setting.value,
        })
    }
}
