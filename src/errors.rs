//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码、类型名称和 HTTP 状态码。

use std::fmt;

use actix_web::{HttpResponse, http::StatusCode};
use tracing::error;

use crate::models::{ApiResponse, ErrorCode};

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - status_code() 方法 - 返回对应的 HTTP 状态码
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_grader_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal, $status:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum GraderError {
            $($variant(String),)*
        }

        impl GraderError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(GraderError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(GraderError::$variant(_) => $type_name,)*
                }
            }

            /// 获取 HTTP 状态码
            pub fn status_code(&self) -> StatusCode {
                let status = match self {
                    $(GraderError::$variant(_) => $status,)*
                };
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(GraderError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl GraderError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        GraderError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_grader_errors! {
    CacheConnection("E001", "Cache Connection Error", 500),
    CachePluginNotFound("E002", "Cache Plugin Not Found", 500),
    DatabaseConfig("E003", "Database Configuration Error", 500),
    DatabaseConnection("E004", "Database Connection Error", 500),
    DatabaseOperation("E005", "Database Operation Error", 500),
    FileOperation("E006", "File Operation Error", 500),
    Validation("E007", "Validation Error", 400),
    NotFound("E008", "Resource Not Found", 404),
    Serialization("E009", "Serialization Error", 500),
    Configuration("E010", "Configuration Error", 500),
    Conflict("E011", "Conflict", 409),
    Authentication("E012", "Authentication Error", 401),
    Authorization("E013", "Authorization Error", 403),
    InsufficientCredits("E014", "Insufficient Credits", 402),
    MonthlyLimitExceeded("E015", "Monthly Credit Limit Exceeded", 403),
    PdfInvalid("E016", "Invalid PDF", 400),
    AiService("E017", "AI Service Error", 502),
    AiResponseInvalid("E018", "AI Response Invalid", 502),
    Email("E019", "Email Delivery Error", 502),
    HttpClient("E020", "HTTP Client Error", 502),
    CsvParse("E021", "CSV Parse Error", 400),
    FileNotFound("E022", "File Not Found", 404),
    BackgroundTask("E023", "Background Task Error", 500),
}

impl GraderError {
    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 对应的业务错误码
    pub fn api_code(&self) -> ErrorCode {
        match self {
            GraderError::Validation(_) => ErrorCode::BadRequest,
            GraderError::NotFound(_) => ErrorCode::NotFound,
            GraderError::FileNotFound(_) => ErrorCode::FileNotFound,
            GraderError::Conflict(_) => ErrorCode::Conflict,
            GraderError::Authentication(_) => ErrorCode::Unauthorized,
            GraderError::Authorization(_) => ErrorCode::Forbidden,
            GraderError::InsufficientCredits(_) => ErrorCode::InsufficientCredits,
            GraderError::MonthlyLimitExceeded(_) => ErrorCode::MonthlyLimitExceeded,
            GraderError::PdfInvalid(_) => ErrorCode::PdfInvalid,
            GraderError::AiService(_) => ErrorCode::AiServiceError,
            GraderError::AiResponseInvalid(_) => ErrorCode::AiResponseInvalid,
            GraderError::CsvParse(_) => ErrorCode::ImportFileParseFailed,
            GraderError::Email(_) | GraderError::HttpClient(_) => ErrorCode::BadGateway,
            _ => ErrorCode::InternalServerError,
        }
    }

    /// 对外展示的错误信息
    ///
    /// 5xx 错误只返回通用提示，详情写入日志。
    pub fn public_message(&self) -> String {
        if !self.status_code().is_server_error() {
            return self.message().to_string();
        }
        error!("{}", self.format_simple());
        match self {
            GraderError::AiService(_) => "AI grading service is unavailable".to_string(),
            GraderError::AiResponseInvalid(_) => {
                "AI grading service returned an invalid report".to_string()
            }
            GraderError::Email(_) | GraderError::HttpClient(_) => {
                "Upstream service error".to_string()
            }
            _ => "Internal server error".to_string(),
        }
    }

    /// 转换为统一 JSON 响应
    pub fn to_http_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(ApiResponse::error_empty(self.api_code(), self.public_message()))
    }
}

impl fmt::Display for GraderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GraderError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for GraderError {
    fn from(err: sea_orm::DbErr) -> Self {
        GraderError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for GraderError {
    fn from(err: std::io::Error) -> Self {
        GraderError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for GraderError {
    fn from(err: serde_json::Error) -> Self {
        GraderError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for GraderError {
    fn from(err: reqwest::Error) -> Self {
        GraderError::HttpClient(err.to_string())
    }
}

impl From<csv::Error> for GraderError {
    fn from(err: csv::Error) -> Self {
        GraderError::CsvParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GraderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(GraderError::cache_connection("test").code(), "E001");
        assert_eq!(GraderError::database_config("test").code(), "E003");
        assert_eq!(GraderError::validation("test").code(), "E007");
        assert_eq!(GraderError::authentication("test").code(), "E012");
        assert_eq!(GraderError::insufficient_credits("test").code(), "E014");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            GraderError::cache_connection("test").error_type(),
            "Cache Connection Error"
        );
        assert_eq!(
            GraderError::ai_response_invalid("test").error_type(),
            "AI Response Invalid"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GraderError::insufficient_credits("x").status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            GraderError::monthly_limit_exceeded("x").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(GraderError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(GraderError::ai_service("x").status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            GraderError::database_operation("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_file_has_its_own_code() {
        assert_eq!(
            GraderError::file_not_found("x").api_code(),
            ErrorCode::FileNotFound
        );
        assert_eq!(GraderError::not_found("x").api_code(), ErrorCode::NotFound);
        assert_eq!(
            GraderError::file_not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_error_message() {
        let err = GraderError::validation("Invalid input");
        assert_eq!(err.message(), "Invalid input");
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let response = GraderError::database_operation("password=hunter2").to_http_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = GraderError::insufficient_credits("需要 12 积分").to_http_response();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn test_format_simple() {
        let err = GraderError::validation("Invalid URL");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("Invalid URL"));
    }
}
