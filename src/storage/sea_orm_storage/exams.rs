//! 考试存储操作

use super::SeaOrmStorage;
use crate::entity::exams::{ActiveModel, Column, Entity as Exams};
use crate::errors::{GraderError, Result};
use crate::models::{
    PaginationInfo,
    exams::{
        entities::Exam,
        requests::{ExamListQuery, NewExam, UpdateExamRequest},
        responses::ExamListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 创建考试
    pub async fn create_exam_impl(&self, exam: NewExam) -> Result<Exam> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            class_id: Set(exam.class_id),
            organization_id: Set(exam.organization_id),
            teacher_id: Set(exam.teacher_id),
            title: Set(exam.title),
            exam_type: Set(exam.exam_type.to_string()),
            solution_file_token: Set(exam.solution_file_token),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("创建考试失败: {e}")))?;

        Ok(result.into_exam())
    }

    /// 通过 ID 获取考试
    pub async fn get_exam_by_id_impl(&self, exam_id: i64) -> Result<Option<Exam>> {
        let result = Exams::find_by_id(exam_id)
            .one(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询考试失败: {e}")))?;

        Ok(result.map(|m| m.into_exam()))
    }

    /// 分页列出班级考试
    pub async fn list_exams_with_pagination_impl(
        &self,
        query: ExamListQuery,
    ) -> Result<ExamListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Exams::find().filter(Column::ClassId.eq(query.class_id));

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(Column::Title.contains(&escaped));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| GraderError::database_operation(format!("查询考试总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| GraderError::database_operation(format!("查询考试页数失败: {e}")))?;

        let exams = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询考试列表失败: {e}")))?;

        Ok(ExamListResponse {
            items: exams.into_iter().map(|m| m.into_exam()).collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 更新考试
    pub async fn update_exam_impl(
        &self,
        exam_id: i64,
        update: UpdateExamRequest,
    ) -> Result<Option<Exam>> {
        if self.get_exam_by_id_impl(exam_id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(exam_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(exam_type) = update.exam_type {
            model.exam_type = Set(exam_type.to_string());
        }
        if let Some(token) = update.solution_file_token {
            model.solution_file_token = Set(Some(token));
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("更新考试失败: {e}")))?;

        self.get_exam_by_id_impl(exam_id).await
    }

    /// 删除考试
    pub async fn delete_exam_impl(&self, exam_id: i64) -> Result<bool> {
        let result = Exams::delete_by_id(exam_id)
            .exec(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("删除考试失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
