//! 组织存储操作

use super::SeaOrmStorage;
use super::users::insert_user_rows;
use crate::entity::organizations::{ActiveModel, Column, Entity as Organizations};
use crate::entity::prelude::{
    Classes, CreditTransactions, Exams, Grades, Profiles, Students, Submissions, Users,
};
use crate::entity::{
    classes, credit_transactions, exams, grades, profiles, students, submissions, users,
};
use crate::errors::{GraderError, Result};
use crate::models::{
    PaginationInfo,
    organizations::{
        entities::Organization,
        requests::{NewOrganization, OrganizationListQuery, OrganizationUpdate},
        responses::OrganizationListResponse,
    },
    users::{entities::User, requests::NewUser},
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

async fn insert_organization_row<C: ConnectionTrait>(
    conn: &C,
    org: NewOrganization,
    now: i64,
) -> Result<Organization> {
    let model = ActiveModel {
        name: Set(org.name),
        subdomain: Set(org.subdomain.to_lowercase()),
        education_level: Set(org.education_level),
        subscription_plan: Set(org.subscription_plan.to_string()),
        credits_remaining: Set(org.credits_remaining),
        credits_per_period: Set(org.credits_per_period),
        renewal_date: Set(org.renewal_date),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = model
        .insert(conn)
        .await
        .map_err(|e| GraderError::database_operation(format!("创建组织失败: {e}")))?;

    Ok(result.into_organization())
}

impl SeaOrmStorage {
    /// 创建组织
    pub async fn create_organization_impl(&self, org: NewOrganization) -> Result<Organization> {
        let now = chrono::Utc::now().timestamp();
        insert_organization_row(&self.db, org, now).await
    }

    /// 创建组织及其校长账号（同一事务）
    pub async fn create_organization_with_director_impl(
        &self,
        org: NewOrganization,
        mut director: NewUser,
    ) -> Result<(Organization, User)> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GraderError::database_operation(format!("开启事务失败: {e}")))?;

        let organization = insert_organization_row(&txn, org, now).await?;
        director.organization_id = Some(organization.id);
        let user = insert_user_rows(&txn, director, now).await?;

        txn.commit()
            .await
            .map_err(|e| GraderError::database_operation(format!("提交事务失败: {e}")))?;

        Ok((organization, user))
    }

    /// 通过 ID 获取组织
    pub async fn get_organization_by_id_impl(&self, id: i64) -> Result<Option<Organization>> {
        let result = Organizations::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询组织失败: {e}")))?;

        Ok(result.map(|m| m.into_organization()))
    }

    /// 通过子域名获取组织
    pub async fn get_organization_by_subdomain_impl(
        &self,
        subdomain: &str,
    ) -> Result<Option<Organization>> {
        let result = Organizations::find()
            .filter(Column::Subdomain.eq(subdomain.trim().to_lowercase()))
            .one(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询组织失败: {e}")))?;

        Ok(result.map(|m| m.into_organization()))
    }

    /// 分页列出组织
    pub async fn list_organizations_with_pagination_impl(
        &self,
        query: OrganizationListQuery,
    ) -> Result<OrganizationListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Organizations::find();

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Name.contains(&escaped))
                    .add(Column::Subdomain.contains(&escaped)),
            );
        }

        select = select.order_by_asc(Column::Name);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| GraderError::database_operation(format!("查询组织总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| GraderError::database_operation(format!("查询组织页数失败: {e}")))?;

        let organizations = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询组织列表失败: {e}")))?;

        Ok(OrganizationListResponse {
            items: organizations
                .into_iter()
                .map(|m| m.into_organization())
                .collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 列出全部组织
    pub async fn list_all_organizations_impl(&self) -> Result<Vec<Organization>> {
        let organizations = Organizations::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询组织列表失败: {e}")))?;

        Ok(organizations
            .into_iter()
            .map(|m| m.into_organization())
            .collect())
    }

    /// 更新组织信息
    pub async fn update_organization_impl(
        &self,
        id: i64,
        update: OrganizationUpdate,
    ) -> Result<Option<Organization>> {
        if self.get_organization_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(education_level) = update.education_level {
            model.education_level = Set(Some(education_level));
        }
        if let Some(plan) = update.subscription_plan {
            model.subscription_plan = Set(plan.to_string());
        }
        if let Some(credits_per_period) = update.credits_per_period {
            model.credits_per_period = Set(credits_per_period);
        }
        if let Some(renewal_date) = update.renewal_date {
            model.renewal_date = Set(renewal_date);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("更新组织失败: {e}")))?;

        self.get_organization_by_id_impl(id).await
    }

    /// 删除组织
    ///
    /// 按依赖顺序逐表删除：评分 → 提交 → 考试 → 学生 → 班级 → 积分流水 → 资料 → 用户 → 组织。
    pub async fn delete_organization_impl(&self, id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GraderError::database_operation(format!("开启事务失败: {e}")))?;

        let map_err = |e: sea_orm::DbErr| GraderError::database_operation(format!("删除组织失败: {e}"));

        let class_ids: Vec<i64> = Classes::find()
            .select_only()
            .column(classes::Column::Id)
            .filter(classes::Column::OrganizationId.eq(id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(map_err)?;
        let exam_ids: Vec<i64> = Exams::find()
            .select_only()
            .column(exams::Column::Id)
            .filter(exams::Column::OrganizationId.eq(id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(map_err)?;
        let user_ids: Vec<i64> = Profiles::find()
            .select_only()
            .column(profiles::Column::UserId)
            .filter(profiles::Column::OrganizationId.eq(id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(map_err)?;

        if !exam_ids.is_empty() {
            Grades::delete_many()
                .filter(grades::Column::ExamId.is_in(exam_ids.clone()))
                .exec(&txn)
                .await
                .map_err(map_err)?;
            Submissions::delete_many()
                .filter(submissions::Column::ExamId.is_in(exam_ids))
                .exec(&txn)
                .await
                .map_err(map_err)?;
        }
        Exams::delete_many()
            .filter(exams::Column::OrganizationId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_err)?;
        if !class_ids.is_empty() {
            Students::delete_many()
                .filter(students::Column::ClassId.is_in(class_ids))
                .exec(&txn)
                .await
                .map_err(map_err)?;
        }
        Classes::delete_many()
            .filter(classes::Column::OrganizationId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_err)?;
        CreditTransactions::delete_many()
            .filter(credit_transactions::Column::OrganizationId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_err)?;
        Profiles::delete_many()
            .filter(profiles::Column::OrganizationId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_err)?;
        if !user_ids.is_empty() {
            Users::delete_many()
                .filter(users::Column::Id.is_in(user_ids))
                .exec(&txn)
                .await
                .map_err(map_err)?;
        }
        let result = Organizations::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(map_err)?;

        txn.commit()
            .await
            .map_err(|e| GraderError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        classes::requests::CreateClassRequest, organizations::entities::SubscriptionPlan,
        students::requests::CreateStudentRequest, users::entities::UserRole,
    };
    use crate::storage::Storage;

    fn new_org(subdomain: &str, credits: i64) -> NewOrganization {
        NewOrganization {
            name: format!("Colegio {subdomain}"),
            subdomain: subdomain.to_string(),
            education_level: Some("secundaria".to_string()),
            subscription_plan: SubscriptionPlan::Basic,
            credits_remaining: credits,
            credits_per_period: credits,
            renewal_date: chrono::Utc::now().timestamp() + 86400,
        }
    }

    fn director(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            full_name: "Directora".to_string(),
            role: UserRole::Director,
            organization_id: None,
            monthly_credit_limit: 0,
        }
    }

    #[tokio::test]
    async fn test_create_with_director_links_profile() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let (org, user) = storage
            .create_organization_with_director(new_org("norte", 100), director("d@norte.edu"))
            .await
            .unwrap();

        assert_eq!(user.profile.organization_id, Some(org.id));
        assert_eq!(user.profile.role, UserRole::Director);
        assert!(
            storage
                .get_organization_by_subdomain("NORTE")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_director_failure_rolls_back_organization() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        storage
            .create_organization_with_director(new_org("uno", 10), director("dup@x.edu"))
            .await
            .unwrap();

        let result = storage
            .create_organization_with_director(new_org("dos", 10), director("dup@x.edu"))
            .await;
        assert!(result.is_err());
        assert!(
            storage
                .get_organization_by_subdomain("dos")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_delete_organization_removes_dependents() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let (org, user) = storage
            .create_organization_with_director(new_org("sur", 10), director("d@sur.edu"))
            .await
            .unwrap();
        let class = storage
            .create_class(
                org.id,
                user.id,
                CreateClassRequest {
                    teacher_id: None,
                    name: "3A".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();
        storage
            .create_student(
                class.id,
                CreateStudentRequest {
                    full_name: "Luis".to_string(),
                    student_email: "luis@sur.edu".to_string(),
                    tutor_email: None,
                },
            )
            .await
            .unwrap();

        assert!(storage.delete_organization(org.id).await.unwrap());
        assert!(storage.get_organization_by_id(org.id).await.unwrap().is_none());
        assert!(storage.get_user_by_id(user.id).await.unwrap().is_none());
        assert!(storage.get_class_by_id(class.id).await.unwrap().is_none());
        assert!(storage.list_student_emails(class.id).await.unwrap().is_empty());
    }
}
