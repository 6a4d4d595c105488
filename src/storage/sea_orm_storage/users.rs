//! 用户存储操作
//!
//! 用户由 users（认证身份）与 profiles（资料）两张表组成，
//! 只有两行都存在时才视为有效用户。

use super::SeaOrmStorage;
use crate::entity::classes::{Column as ClassColumn, Entity as Classes};
use crate::entity::profiles::{
    ActiveModel as ProfileActiveModel, Column as ProfileColumn, Entity as Profiles,
};
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{GraderError, Result};
use crate::models::{
    PaginationInfo,
    users::{
        entities::{User, UserStatus},
        requests::{NewUser, UserListQuery, UserUpdate},
        responses::UserListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::warn;

/// 在给定连接（或事务）上写入 users 与 profiles
pub(super) async fn insert_user_rows<C: ConnectionTrait>(
    conn: &C,
    user: NewUser,
    now: i64,
) -> Result<User> {
    let identity = ActiveModel {
        email: Set(user.email.to_lowercase()),
        password_hash: Set(user.password_hash),
        status: Set(UserStatus::Active.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| GraderError::database_operation(format!("创建用户失败: {e}")))?;

    let profile = ProfileActiveModel {
        user_id: Set(identity.id),
        organization_id: Set(user.organization_id),
        full_name: Set(user.full_name),
        role: Set(user.role.to_string()),
        monthly_credit_limit: Set(user.monthly_credit_limit),
        monthly_credits_used: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(|e| GraderError::database_operation(format!("创建用户资料失败: {e}")))?;

    Ok(identity.into_user(profile))
}

impl SeaOrmStorage {
    /// 创建用户
    pub async fn create_user_impl(&self, user: NewUser) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GraderError::database_operation(format!("开启事务失败: {e}")))?;

        let created = insert_user_rows(&txn, user, now).await?;

        txn.commit()
            .await
            .map_err(|e| GraderError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(created)
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .find_also_related(Profiles)
            .one(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(match result {
            Some((identity, Some(profile))) => Some(identity.into_user(profile)),
            _ => None,
        })
    }

    /// 通过邮箱获取用户（不区分大小写）
    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Email.eq(email.trim().to_lowercase()))
            .find_also_related(Profiles)
            .one(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(match result {
            Some((identity, Some(profile))) => Some(identity.into_user(profile)),
            _ => None,
        })
    }

    /// 分页列出用户
    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Users::find()
            .find_also_related(Profiles)
            .filter(ProfileColumn::UserId.is_not_null());

        // 组织筛选
        if let Some(organization_id) = query.organization_id {
            select = select.filter(ProfileColumn::OrganizationId.eq(organization_id));
        }

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Email.contains(&escaped))
                    .add(ProfileColumn::FullName.contains(&escaped)),
            );
        }

        // 角色筛选
        if let Some(ref role) = query.role {
            select = select.filter(ProfileColumn::Role.eq(role.to_string()));
        }

        // 状态筛选
        if let Some(ref status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        // 排序
        select = select.order_by_desc(Column::CreatedAt);

        // 分页查询
        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| GraderError::database_operation(format!("查询用户总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| GraderError::database_operation(format!("查询用户页数失败: {e}")))?;

        let rows = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询用户列表失败: {e}")))?;

        Ok(UserListResponse {
            items: rows
                .into_iter()
                .filter_map(|(identity, profile)| profile.map(|p| identity.into_user(p)))
                .collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 更新用户最后登录时间
    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("更新最后登录时间失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 更新用户信息
    pub async fn update_user_impl(&self, id: i64, update: UserUpdate) -> Result<Option<User>> {
        // 先检查用户是否存在
        if self.get_user_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GraderError::database_operation(format!("开启事务失败: {e}")))?;

        let mut identity = ActiveModel {
            id: Set(id),
            updated_at: Set(now),
            ..Default::default()
        };
        if let Some(password_hash) = update.password_hash {
            identity.password_hash = Set(password_hash);
        }
        if let Some(status) = update.status {
            identity.status = Set(status.to_string());
        }
        identity
            .update(&txn)
            .await
            .map_err(|e| GraderError::database_operation(format!("更新用户失败: {e}")))?;

        let mut profile = ProfileActiveModel {
            user_id: Set(id),
            updated_at: Set(now),
            ..Default::default()
        };
        if let Some(full_name) = update.full_name {
            profile.full_name = Set(full_name);
        }
        if let Some(role) = update.role {
            profile.role = Set(role.to_string());
        }
        if let Some(limit) = update.monthly_credit_limit {
            profile.monthly_credit_limit = Set(limit);
        }
        profile
            .update(&txn)
            .await
            .map_err(|e| GraderError::database_operation(format!("更新用户资料失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| GraderError::database_operation(format!("提交事务失败: {e}")))?;

        self.get_user_by_id_impl(id).await
    }

    /// 删除用户
    ///
    /// 先删除认证身份；资料行随后尽力删除，失败只记录日志。
    /// 仍负责班级的教师不可删除，返回 Conflict。
    pub async fn delete_user_impl(&self, id: i64) -> Result<bool> {
        let owned_classes = Classes::find()
            .filter(ClassColumn::TeacherId.eq(id))
            .count(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询用户班级失败: {e}")))?;
        if owned_classes > 0 {
            return Err(GraderError::conflict(format!(
                "User {id} still owns {owned_classes} class(es)"
            )));
        }

        let result = Users::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("删除用户失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(false);
        }

        if let Err(e) = Profiles::delete_by_id(id).exec(&self.db).await {
            warn!("删除用户 {} 的资料失败: {}", id, e);
        }

        Ok(true)
    }

    /// 统计用户数量
    pub async fn count_users_impl(&self) -> Result<u64> {
        let count = Users::find()
            .count(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("统计用户数量失败: {e}")))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::Storage;

    fn new_user(email: &str, role: UserRole) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            full_name: "Ana Pérez".to_string(),
            role,
            organization_id: None,
            monthly_credit_limit: 50,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_user_with_profile() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let user = storage
            .create_user(new_user("Ana@School.edu", UserRole::Teacher))
            .await
            .unwrap();

        assert_eq!(user.email, "ana@school.edu");
        assert_eq!(user.profile.role, UserRole::Teacher);
        assert_eq!(user.profile.monthly_credits_used, 0);

        let fetched = storage
            .get_user_by_email("ANA@school.edu")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.profile.monthly_credit_limit, 50);
    }

    #[tokio::test]
    async fn test_update_user_changes_profile_fields() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let user = storage
            .create_user(new_user("t@school.edu", UserRole::Teacher))
            .await
            .unwrap();

        let updated = storage
            .update_user(
                user.id,
                UserUpdate {
                    role: Some(UserRole::Admin),
                    monthly_credit_limit: Some(120),
                    status: Some(UserStatus::Suspended),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.profile.role, UserRole::Admin);
        assert_eq!(updated.profile.monthly_credit_limit, 120);
        assert_eq!(updated.status, UserStatus::Suspended);
        assert!(
            storage
                .update_user(9999, UserUpdate::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_delete_user_removes_identity_and_profile() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let user = storage
            .create_user(new_user("gone@school.edu", UserRole::Teacher))
            .await
            .unwrap();

        assert!(storage.delete_user(user.id).await.unwrap());
        assert!(storage.get_user_by_id(user.id).await.unwrap().is_none());
        let profile = Profiles::find_by_id(user.id).one(&storage.db).await.unwrap();
        assert!(profile.is_none());
        assert!(!storage.delete_user(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_teacher_with_classes_is_not_deleted() {
        use crate::models::grading::entities::NewGrade;
        use crate::test_support::Fixture;

        let fixture = Fixture::new(10, 10).await;
        let (submission, exam) = fixture.submission_with_pages(1).await;
        let grade = fixture
            .storage
            .complete_grading(NewGrade {
                submission_id: submission.id,
                exam_id: exam.id,
                student_id: submission.student_id,
                score_obtained: 8.0,
                score_possible: 10.0,
                ai_feedback: "{}".to_string(),
            })
            .await
            .unwrap();

        let err = fixture
            .storage
            .delete_user(fixture.teacher.id)
            .await
            .unwrap_err();
        assert!(matches!(err, GraderError::Conflict(_)));

        assert!(
            fixture
                .storage
                .get_user_by_id(fixture.teacher.id)
                .await
                .unwrap()
                .is_some()
        );
        let kept = fixture
            .storage
            .get_grade_by_submission_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.id, grade.id);
        assert!(
            fixture
                .storage
                .get_submission_by_id(submission.id)
                .await
                .unwrap()
                .is_some()
        );

        // 班级删除后可以删除教师
        assert!(fixture.storage.delete_class(fixture.class.id).await.unwrap());
        assert!(fixture.storage.delete_user(fixture.teacher.id).await.unwrap());
    }
}
