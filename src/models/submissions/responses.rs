use super::entities::Submission;
use crate::models::{
    common::PaginationInfo, grading::entities::Grade, students::entities::Student,
};
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "submission.ts")]
pub struct SubmissionListResponse {
    pub items: Vec<Submission>,
    pub pagination: PaginationInfo,
}

/// 提交详情（含学生与评分）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "submission.ts")]
pub struct SubmissionDetailResponse {
    pub submission: Submission,
    pub student: Option<Student>,
    pub grade: Option<Grade>,
}
