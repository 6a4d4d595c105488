use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "dashboard.ts")]
pub struct SubmissionStatusCounts {
    pub pending: i64,
    pub processing: i64,
    pub graded: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "dashboard.ts")]
pub struct TeacherDashboardResponse {
    pub class_count: i64,
    pub student_count: i64,
    pub exam_count: i64,
    pub submissions: SubmissionStatusCounts,
    /// 已评分提交的平均得分率（0-100）
    pub average_score_percent: Option<f64>,
    pub monthly_credits_used: i64,
    pub monthly_credit_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "dashboard.ts")]
pub struct RoleCount {
    pub role: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "dashboard.ts")]
pub struct TeacherUsage {
    pub teacher_id: i64,
    pub full_name: String,
    pub monthly_credits_used: i64,
    pub monthly_credit_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "dashboard.ts")]
pub struct OrganizationDashboardResponse {
    pub organization_id: i64,
    pub organization_name: String,
    pub credits_remaining: i64,
    pub credits_per_period: i64,
    pub renewal_date: chrono::DateTime<chrono::Utc>,
    /// 本周期内评分消耗的积分（已扣除退还）
    pub credits_used_this_period: i64,
    pub users_by_role: Vec<RoleCount>,
    pub class_count: i64,
    pub exam_count: i64,
    pub submissions: SubmissionStatusCounts,
    pub average_score_percent: Option<f64>,
    pub teacher_usage: Vec<TeacherUsage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "dashboard.ts")]
pub struct OrganizationSummary {
    pub organization_id: i64,
    pub name: String,
    pub subdomain: String,
    pub subscription_plan: String,
    pub credits_remaining: i64,
    pub user_count: i64,
    pub class_count: i64,
    pub graded_submissions: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "dashboard.ts")]
pub struct InstitutionalTotals {
    pub organizations: i64,
    pub users: i64,
    pub classes: i64,
    pub graded_submissions: i64,
    pub credits_remaining: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "dashboard.ts")]
pub struct InstitutionalDashboardResponse {
    pub organizations: Vec<OrganizationSummary>,
    pub totals: InstitutionalTotals,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}
