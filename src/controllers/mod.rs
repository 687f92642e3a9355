pub mod auth_controller;
pub mod logs_controller;
pub mod notification_controller;
pub mod stock_controller;
pub mod user_controller;
