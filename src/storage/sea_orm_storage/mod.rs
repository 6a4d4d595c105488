//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod audit_logs;
mod classes;
mod credits;
mod exams;
mod files;
mod grades;
mod organizations;
mod stats;
mod students;
mod submissions;
mod users;

use crate::config::AppConfig;
use crate::errors::{GraderError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| GraderError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// 内存 SQLite（测试用），单连接保证所有查询看到同一个库
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| GraderError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opt)
            .await
            .map_err(|e| GraderError::database_connection(format!("SQLite 连接失败: {e}")))?;
        let db = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);

        Migrator::up(&db, None)
            .await
            .map_err(|e| GraderError::database_operation(format!("数据库迁移失败: {e}")))?;

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| GraderError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| GraderError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| GraderError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(GraderError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
use crate::models::{
    audit_logs::{
        entities::{AuditLog, NewAuditLog},
        requests::AuditLogListQuery,
        responses::AuditLogListResponse,
    },
    classes::{
        entities::Class,
        requests::{ClassListQuery, CreateClassRequest, UpdateClassRequest},
        responses::ClassListResponse,
    },
    credits::{
        entities::{CreditReservation, CreditTransaction},
        requests::CreditTransactionListQuery,
        responses::CreditTransactionListResponse,
    },
    dashboard::{
        entities::{StatsScope, TeacherUsageRow},
        responses::{RoleCount, SubmissionStatusCounts},
    },
    exams::{
        entities::Exam,
        requests::{ExamListQuery, NewExam, UpdateExamRequest},
        responses::ExamListResponse,
    },
    files::entities::File,
    grading::entities::{Grade, NewGrade},
    organizations::{
        entities::Organization,
        requests::{NewOrganization, OrganizationListQuery, OrganizationUpdate},
        responses::OrganizationListResponse,
    },
    students::{
        entities::Student,
        requests::{CreateStudentRequest, StudentListQuery},
        responses::StudentListResponse,
    },
    submissions::{
        entities::{Submission, SubmissionStatus},
        requests::SubmissionListQuery,
        responses::SubmissionListResponse,
    },
    users::{
        entities::User,
        requests::{NewUser, UserListQuery, UserUpdate},
        responses::UserListResponse,
    },
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: NewUser) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    // 组织模块
    async fn create_organization(&self, org: NewOrganization) -> Result<Organization> {
        self.create_organization_impl(org).await
    }

    async fn create_organization_with_director(
        &self,
        org: NewOrganization,
        director: NewUser,
    ) -> Result<(Organization, User)> {
        self.create_organization_with_director_impl(org, director)
            .await
    }

    async fn get_organization_by_id(&self, id: i64) -> Result<Option<Organization>> {
        self.get_organization_by_id_impl(id).await
    }

    async fn get_organization_by_subdomain(
        &self,
        subdomain: &str,
    ) -> Result<Option<Organization>> {
        self.get_organization_by_subdomain_impl(subdomain).await
    }

    async fn list_organizations_with_pagination(
        &self,
        query: OrganizationListQuery,
    ) -> Result<OrganizationListResponse> {
        self.list_organizations_with_pagination_impl(query).await
    }

    async fn list_all_organizations(&self) -> Result<Vec<Organization>> {
        self.list_all_organizations_impl().await
    }

    async fn update_organization(
        &self,
        id: i64,
        update: OrganizationUpdate,
    ) -> Result<Option<Organization>> {
        self.update_organization_impl(id, update).await
    }

    async fn delete_organization(&self, id: i64) -> Result<bool> {
        self.delete_organization_impl(id).await
    }

    // 积分模块
    async fn adjust_organization_credits(
        &self,
        organization_id: i64,
        actor_id: i64,
        amount: i64,
        description: Option<String>,
    ) -> Result<CreditTransaction> {
        self.adjust_organization_credits_impl(organization_id, actor_id, amount, description)
            .await
    }

    async fn reserve_grading_credits(
        &self,
        organization_id: i64,
        teacher_id: i64,
        submission_id: i64,
        cost: i64,
    ) -> Result<CreditReservation> {
        self.reserve_grading_credits_impl(organization_id, teacher_id, submission_id, cost)
            .await
    }

    async fn refund_grading_credits(&self, reservation: &CreditReservation) -> Result<bool> {
        self.refund_grading_credits_impl(reservation).await
    }

    async fn renew_due_organizations(&self, now: i64, period_days: i64) -> Result<Vec<i64>> {
        self.renew_due_organizations_impl(now, period_days).await
    }

    async fn list_credit_transactions(
        &self,
        query: CreditTransactionListQuery,
    ) -> Result<CreditTransactionListResponse> {
        self.list_credit_transactions_impl(query).await
    }

    async fn sum_grading_credits_since(&self, organization_id: i64, since: i64) -> Result<i64> {
        self.sum_grading_credits_since_impl(organization_id, since)
            .await
    }

    // 班级模块
    async fn create_class(
        &self,
        organization_id: i64,
        teacher_id: i64,
        class: CreateClassRequest,
    ) -> Result<Class> {
        self.create_class_impl(organization_id, teacher_id, class)
            .await
    }

    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>> {
        self.get_class_by_id_impl(class_id).await
    }

    async fn list_classes_with_pagination(
        &self,
        query: ClassListQuery,
    ) -> Result<ClassListResponse> {
        self.list_classes_with_pagination_impl(query).await
    }

    async fn update_class(
        &self,
        class_id: i64,
        update: UpdateClassRequest,
    ) -> Result<Option<Class>> {
        self.update_class_impl(class_id, update).await
    }

    async fn delete_class(&self, class_id: i64) -> Result<bool> {
        self.delete_class_impl(class_id).await
    }

    // 学生模块
    async fn create_student(
        &self,
        class_id: i64,
        student: CreateStudentRequest,
    ) -> Result<Student> {
        self.create_student_impl(class_id, student).await
    }

    async fn get_student_by_id(&self, student_id: i64) -> Result<Option<Student>> {
        self.get_student_by_id_impl(student_id).await
    }

    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        self.list_students_with_pagination_impl(query).await
    }

    async fn list_student_emails(&self, class_id: i64) -> Result<Vec<String>> {
        self.list_student_emails_impl(class_id).await
    }

    async fn delete_student(&self, student_id: i64) -> Result<bool> {
        self.delete_student_impl(student_id).await
    }

    // 考试模块
    async fn create_exam(&self, exam: NewExam) -> Result<Exam> {
        self.create_exam_impl(exam).await
    }

    async fn get_exam_by_id(&self, exam_id: i64) -> Result<Option<Exam>> {
        self.get_exam_by_id_impl(exam_id).await
    }

    async fn list_exams_with_pagination(&self, query: ExamListQuery) -> Result<ExamListResponse> {
        self.list_exams_with_pagination_impl(query).await
    }

    async fn update_exam(&self, exam_id: i64, update: UpdateExamRequest) -> Result<Option<Exam>> {
        self.update_exam_impl(exam_id, update).await
    }

    async fn delete_exam(&self, exam_id: i64) -> Result<bool> {
        self.delete_exam_impl(exam_id).await
    }

    // 文件模块
    async fn create_file(
        &self,
        download_token: &str,
        original_name: &str,
        stored_name: &str,
        file_size: i64,
        file_type: &str,
        user_id: i64,
    ) -> Result<File> {
        self.create_file_impl(
            download_token,
            original_name,
            stored_name,
            file_size,
            file_type,
            user_id,
        )
        .await
    }

    async fn get_file_by_token(&self, token: &str) -> Result<Option<File>> {
        self.get_file_by_token_impl(token).await
    }

    // 提交模块
    async fn create_submission(
        &self,
        exam_id: i64,
        student_id: i64,
        file_token: &str,
    ) -> Result<Submission> {
        self.create_submission_impl(exam_id, student_id, file_token)
            .await
    }

    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>> {
        self.get_submission_by_id_impl(submission_id).await
    }

    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        self.list_submissions_with_pagination_impl(query).await
    }

    async fn delete_submission(&self, submission_id: i64) -> Result<bool> {
        self.delete_submission_impl(submission_id).await
    }

    async fn claim_submission_for_grading(
        &self,
        submission_id: i64,
        stale_before: i64,
    ) -> Result<bool> {
        self.claim_submission_for_grading_impl(submission_id, stale_before)
            .await
    }

    async fn update_submission_status(
        &self,
        submission_id: i64,
        status: SubmissionStatus,
    ) -> Result<bool> {
        self.update_submission_status_impl(submission_id, status)
            .await
    }

    async fn complete_grading(&self, grade: NewGrade) -> Result<Grade> {
        self.complete_grading_impl(grade).await
    }

    async fn get_grade_by_submission_id(&self, submission_id: i64) -> Result<Option<Grade>> {
        self.get_grade_by_submission_id_impl(submission_id).await
    }

    // 审计日志模块
    async fn create_audit_log(&self, log: NewAuditLog) -> Result<AuditLog> {
        self.create_audit_log_impl(log).await
    }

    async fn list_audit_logs_with_pagination(
        &self,
        query: AuditLogListQuery,
    ) -> Result<AuditLogListResponse> {
        self.list_audit_logs_with_pagination_impl(query).await
    }

    // 统计模块
    async fn count_classes(&self, scope: StatsScope) -> Result<i64> {
        self.count_classes_impl(scope).await
    }

    async fn count_students(&self, scope: StatsScope) -> Result<i64> {
        self.count_students_impl(scope).await
    }

    async fn count_exams(&self, scope: StatsScope) -> Result<i64> {
        self.count_exams_impl(scope).await
    }

    async fn count_submissions_by_status(
        &self,
        scope: StatsScope,
    ) -> Result<SubmissionStatusCounts> {
        self.count_submissions_by_status_impl(scope).await
    }

    async fn list_grade_scores(&self, scope: StatsScope) -> Result<Vec<(f64, f64)>> {
        self.list_grade_scores_impl(scope).await
    }

    async fn count_profiles_by_role(
        &self,
        organization_id: Option<i64>,
    ) -> Result<Vec<RoleCount>> {
        self.count_profiles_by_role_impl(organization_id).await
    }

    async fn list_teacher_usage(&self, organization_id: i64) -> Result<Vec<TeacherUsageRow>> {
        self.list_teacher_usage_impl(organization_id).await
    }
}
