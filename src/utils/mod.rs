pub mod csv_import;
pub mod extractor;
pub mod file_magic;
pub mod jwt;
pub mod multipart;
pub mod parameter_error_handler;
pub mod password;
pub mod random_code;
pub mod sql;
pub mod validate;

pub use extractor::{
    SafeClassIdI64, SafeExamIdI64, SafeFileToken, SafeIDI64, SafeOrganizationIdI64,
    SafeStudentIdI64, SafeSubmissionIdI64,
};
pub use file_magic::{is_pdf, validate_magic_bytes};
pub use parameter_error_handler::json_error_handler;
pub use parameter_error_handler::query_error_handler;
pub use sql::escape_like_pattern;
