use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::ErrorCode;

/// 统一响应信封，timestamp 为 unix 秒
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "api.ts")]
pub struct ApiResponse<T: TS> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: i64,
}

impl<T: TS> ApiResponse<T> {
    fn envelope(code: ErrorCode, data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self::envelope(ErrorCode::Success, Some(data), message)
    }
}

impl ApiResponse<()> {
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self::envelope(ErrorCode::Success, None, message)
    }

    pub fn error_empty(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::envelope(code, None, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_omits_data() {
        let value = serde_json::to_value(ApiResponse::error_empty(
            ErrorCode::ClassNotFound,
            "Class not found",
        ))
        .unwrap();
        assert_eq!(value["code"], ErrorCode::ClassNotFound as i32);
        assert!(value.get("data").is_none());
        assert!(value["timestamp"].as_i64().unwrap() > 0);
    }
}
