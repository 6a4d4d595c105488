use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "exam.ts")]
pub enum ExamType {
    Exam,
    Assignment,
}

impl std::fmt::Display for ExamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExamType::Exam => write!(f, "exam"),
            ExamType::Assignment => write!(f, "assignment"),
        }
    }
}

impl std::str::FromStr for ExamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exam" => Ok(ExamType::Exam),
            "assignment" => Ok(ExamType::Assignment),
            _ => Err(format!("Invalid exam type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "exam.ts")]
pub struct Exam {
    pub id: i64,
    pub class_id: i64,
    pub organization_id: i64,
    pub teacher_id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub exam_type: ExamType,
    /// 标准答案 PDF 的文件令牌
    pub solution_file_token: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
