use super::entities::Class;
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

/// 列表项：班级本身加上学生数和考试数
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct ClassListItem {
    #[serde(flatten)]
    #[ts(flatten)]
    pub class: Class,
    pub student_count: i64,
    pub exam_count: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct ClassListResponse {
    pub pagination: PaginationInfo,
    pub items: Vec<ClassListItem>,
}
