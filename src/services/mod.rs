pub mod access;
pub mod audit_logs;
pub mod auth;
pub mod classes;
pub mod credits;
pub mod dashboard;
pub mod email;
pub mod exams;
pub mod files;
pub mod grading;
pub mod organizations;
pub mod students;
pub mod submissions;
pub mod users;

pub use audit_logs::AuditLogService;
pub use auth::AuthService;
pub use classes::ClassService;
pub use dashboard::DashboardService;
pub use exams::ExamService;
pub use files::FileService;
pub use grading::GradingService;
pub use organizations::OrganizationService;
pub use students::StudentService;
pub use submissions::SubmissionService;
pub use users::UserService;

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode, web};

use crate::cache::ObjectCache;
use crate::errors::GraderError;
use crate::middlewares::RequireJWT;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::{BlobStore, Storage};
use crate::utils::csv_import::ImportParseError;
use crate::utils::multipart::UploadError;

/// 业务拒绝：HTTP 状态码 + 业务错误码 + 提示信息
#[derive(Debug)]
pub struct Rejection {
    status: StatusCode,
    code: ErrorCode,
    message: String,
}

pub type ServiceResult<T> = std::result::Result<T, Rejection>;

impl Rejection {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code, message)
    }

    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn into_response(self) -> HttpResponse {
        HttpResponse::build(self.status).json(ApiResponse::error_empty(self.code, self.message))
    }
}

impl From<GraderError> for Rejection {
    fn from(err: GraderError) -> Self {
        Self::new(err.status_code(), err.api_code(), err.public_message())
    }
}

impl From<UploadError> for Rejection {
    fn from(err: UploadError) -> Self {
        Self::bad_request(err.error_code(), err.message())
    }
}

impl From<ImportParseError> for Rejection {
    fn from(err: ImportParseError) -> Self {
        Self::bad_request(err.error_code(), err.message())
    }
}

/// 将业务结果统一转换为 HTTP 响应
pub(crate) fn respond(result: ServiceResult<HttpResponse>) -> ActixResult<HttpResponse> {
    Ok(result.unwrap_or_else(Rejection::into_response))
}

/// 从 app_data 取存储实例
pub(crate) fn storage_from_request(request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| GraderError::configuration("Storage not found in app data").into())
}

/// 从 app_data 取文件存储
pub(crate) fn blobs_from_request(request: &HttpRequest) -> ServiceResult<Arc<dyn BlobStore>> {
    request
        .app_data::<web::Data<Arc<dyn BlobStore>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| GraderError::configuration("Blob store not found in app data").into())
}

pub(crate) fn cache_from_request(request: &HttpRequest) -> Option<Arc<dyn ObjectCache>> {
    request
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone())
}

/// 当前登录用户（须挂载 RequireJWT）
pub(crate) fn current_user(request: &HttpRequest) -> ServiceResult<User> {
    RequireJWT::extract_user(request).ok_or_else(|| Rejection::unauthorized("Unauthorized"))
}

pub(crate) fn client_ip(request: &HttpRequest) -> Option<String> {
    request
        .connection_info()
        .realip_remote_addr()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_from_grader_error_keeps_status() {
        let rejection = Rejection::from(GraderError::insufficient_credits("need 12"));
        assert_eq!(rejection.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(rejection.code(), ErrorCode::InsufficientCredits);

        let rejection = Rejection::from(GraderError::database_operation("secret detail"));
        assert_eq!(rejection.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(rejection.message, "Internal server error");
    }

    #[test]
    fn test_respond_renders_rejection() {
        let response = respond(Err(Rejection::not_found(
            ErrorCode::ClassNotFound,
            "Class not found",
        )))
        .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
