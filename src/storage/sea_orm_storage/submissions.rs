//! 提交存储操作

use super::SeaOrmStorage;
use crate::entity::submissions::{ActiveModel, Column, Entity as Submissions};
use crate::errors::{GraderError, Result};
use crate::models::{
    PaginationInfo,
    submissions::{
        entities::{Submission, SubmissionStatus},
        requests::SubmissionListQuery,
        responses::SubmissionListResponse,
    },
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 创建提交，初始状态为 pending
    pub async fn create_submission_impl(
        &self,
        exam_id: i64,
        student_id: i64,
        file_token: &str,
    ) -> Result<Submission> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            exam_id: Set(exam_id),
            student_id: Set(student_id),
            file_token: Set(file_token.to_string()),
            status: Set(SubmissionStatus::PENDING.to_string()),
            ai_feedback: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("创建提交失败: {e}")))?;

        Ok(result.into_submission())
    }

    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(
        &self,
        submission_id: i64,
    ) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(submission_id)
            .one(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 分页列出考试的提交
    pub async fn list_submissions_with_pagination_impl(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Submissions::find().filter(Column::ExamId.eq(query.exam_id));

        if let Some(ref status) = query.status {
            select = select.filter(Column::Status.eq(status.as_str()));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| GraderError::database_operation(format!("查询提交总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| GraderError::database_operation(format!("查询提交页数失败: {e}")))?;

        let submissions = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询提交列表失败: {e}")))?;

        Ok(SubmissionListResponse {
            items: submissions
                .into_iter()
                .map(|m| m.into_submission())
                .collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 删除提交
    pub async fn delete_submission_impl(&self, submission_id: i64) -> Result<bool> {
        let result = Submissions::delete_by_id(submission_id)
            .exec(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("删除提交失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 抢占提交进入 processing 状态
    ///
    /// 条件更新保证同一提交同时只有一个评分流程。
    /// updated_at 早于 `stale_before` 的 processing 记录视为遗留占用，可再次抢占。
    pub async fn claim_submission_for_grading_impl(
        &self,
        submission_id: i64,
        stale_before: i64,
    ) -> Result<bool> {
        let result = Submissions::update_many()
            .col_expr(Column::Status, Expr::value(SubmissionStatus::PROCESSING))
            .col_expr(
                Column::UpdatedAt,
                Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(Column::Id.eq(submission_id))
            .filter(
                Condition::any()
                    .add(Column::Status.ne(SubmissionStatus::PROCESSING))
                    .add(Column::UpdatedAt.lt(stale_before)),
            )
            .exec(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("更新提交状态失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 更新提交状态
    pub async fn update_submission_status_impl(
        &self,
        submission_id: i64,
        status: SubmissionStatus,
    ) -> Result<bool> {
        let result = Submissions::update_many()
            .col_expr(Column::Status, Expr::value(status.as_str()))
            .col_expr(
                Column::UpdatedAt,
                Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(Column::Id.eq(submission_id))
            .exec(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("更新提交状态失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::submissions::entities::SubmissionStatus;
    use crate::storage::Storage;
    use crate::test_support::Fixture;

    #[tokio::test]
    async fn test_claim_is_exclusive_until_stale() {
        let fixture = Fixture::new(10, 10).await;
        let (submission, _) = fixture.submission_with_pages(1).await;
        let storage = &fixture.storage;
        let now = chrono::Utc::now().timestamp();

        assert!(
            storage
                .claim_submission_for_grading(submission.id, now - 600)
                .await
                .unwrap()
        );
        // 仍在有效期内的占用不可重复抢占
        assert!(
            !storage
                .claim_submission_for_grading(submission.id, now - 600)
                .await
                .unwrap()
        );
        // 早于过期线的占用可被接管
        assert!(
            storage
                .claim_submission_for_grading(submission.id, now + 5)
                .await
                .unwrap()
        );

        let stored = storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Processing);
    }
}
