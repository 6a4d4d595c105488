pub mod audit_logs;
pub mod auth;
pub mod classes;
pub mod common;
pub mod credits;
pub mod dashboard;
pub mod exams;
pub mod files;
pub mod grading;
pub mod organizations;
pub mod students;
pub mod submissions;
pub mod users;

pub use common::{ApiResponse, PaginationInfo, PaginationQuery};

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// 业务错误码（响应体中的 code 字段）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1009,
    RateLimitExceeded = 1029,
    InternalServerError = 1500,
    BadGateway = 1502,

    // 认证与用户
    AuthFailed = 2000,
    UserNotFound = 2001,
    UserEmailAlreadyExists = 2002,
    UserEmailInvalid = 2003,
    UserPasswordInvalid = 2004,
    UserNameInvalid = 2005,
    UserUpdateFailed = 2007,
    CanNotDeleteCurrentUser = 2009,
    UserOwnsClasses = 2010,

    // 组织
    OrganizationNotFound = 2100,
    OrganizationSubdomainExists = 2101,
    OrganizationSubdomainInvalid = 2102,

    // 班级与学生
    ClassNotFound = 2200,
    ClassPermissionDenied = 2201,
    StudentNotFound = 2300,
    StudentAlreadyExists = 2301,

    // 考试
    ExamNotFound = 2400,
    ExamSolutionMissing = 2401,

    // 文件
    FileNotFound = 2500,
    FileUploadFailed = 2501,
    FileTypeNotAllowed = 2502,
    FileSizeExceeded = 2503,
    MultifileUploadNotAllowed = 2504,

    // 提交与评分
    SubmissionNotFound = 2600,
    SubmissionAlreadyProcessing = 2601,
    GradeNotFound = 2602,

    // 积分与 AI
    InsufficientCredits = 3001,
    MonthlyLimitExceeded = 3002,
    PdfInvalid = 3003,
    AiServiceError = 3004,
    AiResponseInvalid = 3005,

    // 导入
    ImportFileParseFailed = 4001,
    ImportFileMissingColumn = 4002,
    ImportFileDataInvalid = 4003,
    ImportTooManyRows = 4004,
}
