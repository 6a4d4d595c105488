use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct GradeSubmissionRequest {
    #[serde(alias = "submissionId")]
    pub submission_id: i64,
}
