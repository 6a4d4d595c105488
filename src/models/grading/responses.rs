use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct GradeSubmissionResponse {
    pub feedback: serde_json::Value,
    pub grade_id: i64,
    pub credits_used: i64,
    pub credits_remaining: i64,
    pub monthly_credits_used: i64,
    pub monthly_credit_limit: i64,
}
