use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "student.ts")]
pub struct Student {
    pub id: i64,
    pub class_id: i64,
    pub full_name: String,
    pub student_email: String,
    pub tutor_email: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
