use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 评分结果
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct Grade {
    pub id: i64,
    pub submission_id: i64,
    pub exam_id: i64,
    pub student_id: i64,
    pub score_obtained: f64,
    pub score_possible: f64,
    /// 经过校验的评估报告
    pub ai_feedback: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 新评分（用于存储层）
#[derive(Debug, Clone)]
pub struct NewGrade {
    pub submission_id: i64,
    pub exam_id: i64,
    pub student_id: i64,
    pub score_obtained: f64,
    pub score_possible: f64,
    pub ai_feedback: String,
}
