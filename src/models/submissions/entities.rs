use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 提交状态：pending → processing → graded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "submission.ts")]
pub enum SubmissionStatus {
    Pending,
    Processing,
    Graded,
}

impl SubmissionStatus {
    pub const PENDING: &'static str = "pending";
    pub const PROCESSING: &'static str = "processing";
    pub const GRADED: &'static str = "graded";

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => Self::PENDING,
            SubmissionStatus::Processing => Self::PROCESSING,
            SubmissionStatus::Graded => Self::GRADED,
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::PENDING => Ok(SubmissionStatus::Pending),
            Self::PROCESSING => Ok(SubmissionStatus::Processing),
            Self::GRADED => Ok(SubmissionStatus::Graded),
            _ => Err(format!("Invalid submission status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "submission.ts")]
pub struct Submission {
    pub id: i64,
    pub exam_id: i64,
    pub student_id: i64,
    pub file_token: String,
    pub status: SubmissionStatus,
    pub ai_feedback: Option<serde_json::Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
