use super::entities::SubmissionStatus;
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "submission.ts")]
pub struct CreateSubmissionRequest {
    pub student_id: i64,
    pub file_token: String,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "submission.ts")]
pub struct SubmissionListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub status: Option<SubmissionStatus>,
}

// 提交列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct SubmissionListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub exam_id: i64,
    pub status: Option<SubmissionStatus>,
}
