pub mod import;
pub mod pagination;
pub mod response;

pub use import::{ImportRowError, ImportSummary};
pub use pagination::{PaginationInfo, PaginationQuery};
pub use response::ApiResponse;
