//! 评分存储操作

use super::SeaOrmStorage;
use crate::entity::grades::{ActiveModel, Column, Entity as Grades};
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::errors::{GraderError, Result};
use crate::models::{
    grading::entities::{Grade, NewGrade},
    submissions::entities::SubmissionStatus,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 写入评分并将提交置为 graded（同一事务）
    pub async fn complete_grading_impl(&self, grade: NewGrade) -> Result<Grade> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GraderError::database_operation(format!("开启事务失败: {e}")))?;

        let updated = Submissions::update_many()
            .col_expr(
                SubmissionColumn::Status,
                Expr::value(SubmissionStatus::GRADED),
            )
            .col_expr(
                SubmissionColumn::AiFeedback,
                Expr::value(grade.ai_feedback.clone()),
            )
            .col_expr(SubmissionColumn::UpdatedAt, Expr::value(now))
            .filter(SubmissionColumn::Id.eq(grade.submission_id))
            .exec(&txn)
            .await
            .map_err(|e| GraderError::database_operation(format!("更新提交状态失败: {e}")))?;

        if updated.rows_affected == 0 {
            return Err(GraderError::not_found(format!(
                "提交 {} 不存在",
                grade.submission_id
            )));
        }

        let model = ActiveModel {
            submission_id: Set(grade.submission_id),
            exam_id: Set(grade.exam_id),
            student_id: Set(grade.student_id),
            score_obtained: Set(grade.score_obtained),
            score_possible: Set(grade.score_possible),
            ai_feedback: Set(grade.ai_feedback),
            created_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&txn)
            .await
            .map_err(|e| GraderError::database_operation(format!("创建评分失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| GraderError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.into_grade())
    }

    /// 获取提交的最新评分
    pub async fn get_grade_by_submission_id_impl(
        &self,
        submission_id: i64,
    ) -> Result<Option<Grade>> {
        let result = Grades::find()
            .filter(Column::SubmissionId.eq(submission_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .one(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询评分失败: {e}")))?;

        Ok(result.map(|m| m.into_grade()))
    }
}
