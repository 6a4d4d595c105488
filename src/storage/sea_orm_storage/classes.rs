//! 班级存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::classes::{ActiveModel, Column, Entity as Classes};
use crate::entity::exams::{Column as ExamColumn, Entity as Exams};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::errors::{GraderError, Result};
use crate::models::{
    PaginationInfo,
    classes::{
        entities::Class,
        requests::{ClassListQuery, CreateClassRequest, UpdateClassRequest},
        responses::{ClassListItem, ClassListResponse},
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

fn db_err(what: &str) -> impl Fn(sea_orm::DbErr) -> GraderError + '_ {
    move |e| GraderError::database_operation(format!("{what}: {e}"))
}

impl SeaOrmStorage {
    /// organization_id 与 teacher_id 由服务层校验后传入
    pub async fn create_class_impl(
        &self,
        organization_id: i64,
        teacher_id: i64,
        req: CreateClassRequest,
    ) -> Result<Class> {
        let now = chrono::Utc::now().timestamp();
        let inserted = ActiveModel {
            organization_id: Set(organization_id),
            teacher_id: Set(teacher_id),
            name: Set(req.name.trim().to_string()),
            description: Set(req.description.filter(|d| !d.trim().is_empty())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(db_err("创建班级失败"))?;

        Ok(inserted.into_class())
    }

    pub async fn get_class_by_id_impl(&self, class_id: i64) -> Result<Option<Class>> {
        Ok(Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(db_err("查询班级失败"))?
            .map(|m| m.into_class()))
    }

    /// 按班级分组计数
    async fn count_by_class(&self, class_ids: &[i64], exams: bool) -> Result<HashMap<i64, i64>> {
        if class_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(i64, i64)> = if exams {
            Exams::find()
                .select_only()
                .column(ExamColumn::ClassId)
                .column_as(ExamColumn::Id.count(), "count")
                .filter(ExamColumn::ClassId.is_in(class_ids.to_vec()))
                .group_by(ExamColumn::ClassId)
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(db_err("统计班级考试失败"))?
        } else {
            Students::find()
                .select_only()
                .column(StudentColumn::ClassId)
                .column_as(StudentColumn::Id.count(), "count")
                .filter(StudentColumn::ClassId.is_in(class_ids.to_vec()))
                .group_by(StudentColumn::ClassId)
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(db_err("统计班级学生失败"))?
        };
        Ok(rows.into_iter().collect())
    }

    /// 分页列出班级，附带学生数与考试数
    pub async fn list_classes_with_pagination_impl(
        &self,
        query: ClassListQuery,
    ) -> Result<ClassListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Classes::find();
        if let Some(organization_id) = query.organization_id {
            select = select.filter(Column::OrganizationId.eq(organization_id));
        }
        if let Some(teacher_id) = query.teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }
        if let Some(search) = query.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            select = select.filter(Column::Name.contains(escape_like_pattern(search)));
        }

        let paginator = select
            .order_by_asc(Column::Name)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);
        let counts = paginator
            .num_items_and_pages()
            .await
            .map_err(db_err("查询班级总数失败"))?;
        let classes: Vec<Class> = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_err("查询班级列表失败"))?
            .into_iter()
            .map(|m| m.into_class())
            .collect();

        let ids: Vec<i64> = classes.iter().map(|c| c.id).collect();
        let students = self.count_by_class(&ids, false).await?;
        let exams = self.count_by_class(&ids, true).await?;

        let items = classes
            .into_iter()
            .map(|class| ClassListItem {
                student_count: students.get(&class.id).copied().unwrap_or(0),
                exam_count: exams.get(&class.id).copied().unwrap_or(0),
                class,
            })
            .collect();

        Ok(ClassListResponse {
            items,
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: counts.number_of_items as i64,
                total_pages: counts.number_of_pages as i64,
            },
        })
    }

    /// 只改动请求中出现的字段；空描述视为清除
    pub async fn update_class_impl(
        &self,
        class_id: i64,
        update: UpdateClassRequest,
    ) -> Result<Option<Class>> {
        let Some(existing) = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(db_err("查询班级失败"))?
        else {
            return Ok(None);
        };

        let mut model = existing.into_active_model();
        if let Some(name) = update.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(description) = update.description {
            let description = description.trim().to_string();
            model.description = Set((!description.is_empty()).then_some(description));
        }
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let updated = model
            .update(&self.db)
            .await
            .map_err(db_err("更新班级失败"))?;
        Ok(Some(updated.into_class()))
    }

    /// 学生、考试、提交随外键级联删除
    pub async fn delete_class_impl(&self, class_id: i64) -> Result<bool> {
        let result = Classes::delete_by_id(class_id)
            .exec(&self.db)
            .await
            .map_err(db_err("删除班级失败"))?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::classes::requests::{ClassListQuery, UpdateClassRequest};
    use crate::models::exams::entities::ExamType;
    use crate::models::exams::requests::NewExam;
    use crate::models::students::requests::CreateStudentRequest;
    use crate::storage::Storage;
    use crate::test_support::Fixture;

    #[tokio::test]
    async fn test_list_includes_student_and_exam_counts() {
        let fixture = Fixture::new(100, 50).await;
        let storage = &fixture.storage;
        storage
            .create_student(
                fixture.class.id,
                CreateStudentRequest {
                    full_name: "Luis Gómez".to_string(),
                    student_email: "luis@alpha.test".to_string(),
                    tutor_email: None,
                },
            )
            .await
            .unwrap();
        storage
            .create_exam(NewExam {
                class_id: fixture.class.id,
                organization_id: fixture.organization.id,
                teacher_id: fixture.teacher.id,
                title: "Recuperación".to_string(),
                exam_type: ExamType::Exam,
                solution_file_token: None,
            })
            .await
            .unwrap();

        let response = storage
            .list_classes_with_pagination(ClassListQuery {
                organization_id: Some(fixture.organization.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(response.pagination.total, 1);
        assert_eq!(response.items[0].student_count, 2);
        assert_eq!(response.items[0].exam_count, 2);

        let other_org = storage
            .list_classes_with_pagination(ClassListQuery {
                organization_id: Some(fixture.organization.id + 1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(other_org.items.is_empty());
    }

    #[tokio::test]
    async fn test_update_clears_blank_description() {
        let fixture = Fixture::new(100, 50).await;
        let updated = fixture
            .storage
            .update_class(
                fixture.class.id,
                UpdateClassRequest {
                    name: Some("  3C ".to_string()),
                    description: Some("   ".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "3C");
        assert!(updated.description.is_none());

        assert!(fixture.storage.delete_class(fixture.class.id).await.unwrap());
        assert!(
            fixture
                .storage
                .get_class_by_id(fixture.class.id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
