pub mod auth_dto;
pub mod common_dto;
pub mod logs_dto;
pub mod notification_dto;
pub mod stock_dto;
pub mod user_dto;
