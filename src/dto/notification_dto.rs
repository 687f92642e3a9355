use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::validation::validate_setting_key;

// Setting update (admin)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSettingRequest {
    #[validate(custom = "validate_setting_key")]
    pub key: String,
    #[validate(length(max = 255))]
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateSettingResponse {
    pub message: String,
    pub key: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_fail_validation() {
        let request = UpdateSettingRequest {
            key: "maintenance_mode".into(),
            value: "on".into(),
        };
        assert!(request.validate().unwrap_err().field_errors().contains_key("key"));

        let request = UpdateSettingRequest {
            key: "low_stock_threshold".into(),
            value: "250".into(),
        };
        assert!(request.validate().is_ok());
    }
}
