pub mod refresh_token_repository;
pub mod settings_repository;
pub mod stock_repository;
pub mod system_log_repository;
pub mod user_repository;
