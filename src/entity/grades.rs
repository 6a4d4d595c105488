//! 评分实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "grades")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub submission_id: i64,
    pub exam_id: i64,
    pub student_id: i64,
    #[sea_orm(column_type = "Double")]
    pub score_obtained: f64,
    #[sea_orm(column_type = "Double")]
    pub score_possible: f64,
    #[sea_orm(column_type = "Text")]
    pub ai_feedback: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::submissions::Entity",
        from = "Column::SubmissionId",
        to = "super::submissions::Column::Id"
    )]
    Submission,
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_grade(self) -> crate::models::grading::entities::Grade {
        use crate::models::grading::entities::Grade;

        Grade {
            id: self.id,
            submission_id: self.submission_id,
            exam_id: self.exam_id,
            student_id: self.student_id,
            score_obtained: self.score_obtained,
            score_possible: self.score_possible,
            ai_feedback: serde_json::from_str(&self.ai_feedback)
                .unwrap_or(serde_json::Value::String(self.ai_feedback)),
            created_at: super::to_datetime(self.created_at),
        }
    }
}
