//! 学生存储操作

use super::SeaOrmStorage;
use crate::entity::students::{ActiveModel, Column, Entity as Students};
use crate::errors::{GraderError, Result};
use crate::models::{
    PaginationInfo,
    students::{
        entities::Student,
        requests::{CreateStudentRequest, StudentListQuery},
        responses::StudentListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

impl SeaOrmStorage {
    /// 创建学生（邮箱统一小写）
    pub async fn create_student_impl(
        &self,
        class_id: i64,
        req: CreateStudentRequest,
    ) -> Result<Student> {
        let model = ActiveModel {
            class_id: Set(class_id),
            full_name: Set(req.full_name.trim().to_string()),
            student_email: Set(req.student_email.trim().to_lowercase()),
            tutor_email: Set(req
                .tutor_email
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("创建学生失败: {e}")))?;

        Ok(result.into_student())
    }

    /// 通过 ID 获取学生
    pub async fn get_student_by_id_impl(&self, student_id: i64) -> Result<Option<Student>> {
        let result = Students::find_by_id(student_id)
            .one(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(result.map(|m| m.into_student()))
    }

    /// 分页列出班级学生
    pub async fn list_students_with_pagination_impl(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(20).clamp(1, 200) as u64;

        let mut select = Students::find().filter(Column::ClassId.eq(query.class_id));

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::FullName.contains(&escaped))
                    .add(Column::StudentEmail.contains(&escaped)),
            );
        }

        let paginator = select
            .order_by_asc(Column::FullName)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| GraderError::database_operation(format!("查询学生总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| GraderError::database_operation(format!("查询学生页数失败: {e}")))?;

        let students = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询学生列表失败: {e}")))?;

        Ok(StudentListResponse {
            items: students.into_iter().map(|m| m.into_student()).collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 班级内已存在的学生邮箱
    pub async fn list_student_emails_impl(&self, class_id: i64) -> Result<Vec<String>> {
        Students::find()
            .select_only()
            .column(Column::StudentEmail)
            .filter(Column::ClassId.eq(class_id))
            .into_tuple::<String>()
            .all(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询学生邮箱失败: {e}")))
    }

    /// 删除学生
    pub async fn delete_student_impl(&self, student_id: i64) -> Result<bool> {
        let result = Students::delete_by_id(student_id)
            .exec(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("删除学生失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
