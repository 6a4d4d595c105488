use super::entities::ExamType;
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "exam.ts")]
pub struct ExamListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "exam.ts")]
pub struct CreateExamRequest {
    pub title: String,
    #[serde(rename = "type", default = "default_exam_type")]
    pub exam_type: ExamType,
    pub solution_file_token: Option<String>,
}

fn default_exam_type() -> ExamType {
    ExamType::Exam
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "exam.ts")]
pub struct UpdateExamRequest {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub exam_type: Option<ExamType>,
    pub solution_file_token: Option<String>,
}

// 考试列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct ExamListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub class_id: i64,
    pub search: Option<String>,
}

// 新考试（用于存储层）
#[derive(Debug, Clone)]
pub struct NewExam {
    pub class_id: i64,
    pub organization_id: i64,
    pub teacher_id: i64,
    pub title: String,
    pub exam_type: ExamType,
    pub solution_file_token: Option<String>,
}
