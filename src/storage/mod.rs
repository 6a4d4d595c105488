use std::sync::Arc;

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

use crate::errors::Result;

pub mod blob;
pub mod sea_orm_storage;

pub use blob::{BlobStore, LocalBlobStore, create_blob_store};

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（身份与资料在同一事务中写入）
    async fn create_user(&self, user: NewUser) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>>;
    // 删除用户身份，资料行尽力删除
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计用户数量
    async fn count_users(&self) -> Result<u64>;

    /// 组织管理方法
    async fn create_organization(&self, org: NewOrganization) -> Result<Organization>;
    // 在同一事务中创建组织与校长账号
    async fn create_organization_with_director(
        &self,
        org: NewOrganization,
        director: NewUser,
    ) -> Result<(Organization, User)>;
    async fn get_organization_by_id(&self, id: i64) -> Result<Option<Organization>>;
    async fn get_organization_by_subdomain(&self, subdomain: &str)
    -> Result<Option<Organization>>;
    async fn list_organizations_with_pagination(
        &self,
        query: OrganizationListQuery,
    ) -> Result<OrganizationListResponse>;
    async fn list_all_organizations(&self) -> Result<Vec<Organization>>;
    async fn update_organization(
        &self,
        id: i64,
        update: OrganizationUpdate,
    ) -> Result<Option<Organization>>;
    // 显式逐表删除组织下的所有数据
    async fn delete_organization(&self, id: i64) -> Result<bool>;

    /// 积分方法
    // 手动调整组织积分，余额不会低于 0
    async fn adjust_organization_credits(
        &self,
        organization_id: i64,
        actor_id: i64,
        amount: i64,
        description: Option<String>,
    ) -> Result<CreditTransaction>;
    // 原子预留评分积分：组织余额不足返回 InsufficientCredits，教师月度额度不足返回 MonthlyLimitExceeded
    async fn reserve_grading_credits(
        &self,
        organization_id: i64,
        teacher_id: i64,
        submission_id: i64,
        cost: i64,
    ) -> Result<CreditReservation>;
    // 退还一次预留
    async fn refund_grading_credits(&self, reservation: &CreditReservation) -> Result<bool>;
    // 续期所有到期组织，返回续期的组织 ID
    async fn renew_due_organizations(&self, now: i64, period_days: i64) -> Result<Vec<i64>>;
    async fn list_credit_transactions(
        &self,
        query: CreditTransactionListQuery,
    ) -> Result<CreditTransactionListResponse>;
    // 统计某时间点之后的评分净消耗
    async fn sum_grading_credits_since(&self, organization_id: i64, since: i64) -> Result<i64>;

    /// 班级管理方法
    async fn create_class(
        &self,
        organization_id: i64,
        teacher_id: i64,
        class: CreateClassRequest,
    ) -> Result<Class>;
    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>>;
    async fn list_classes_with_pagination(
        &self,
        query: ClassListQuery,
    ) -> Result<ClassListResponse>;
    async fn update_class(
        &self,
        class_id: i64,
        update: UpdateClassRequest,
    ) -> Result<Option<Class>>;
    async fn delete_class(&self, class_id: i64) -> Result<bool>;

    /// 学生管理方法
    async fn create_student(&self, class_id: i64, student: CreateStudentRequest)
    -> Result<Student>;
    async fn get_student_by_id(&self, student_id: i64) -> Result<Option<Student>>;
    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse>;
    // 班级内已存在的学生邮箱（小写）
    async fn list_student_emails(&self, class_id: i64) -> Result<Vec<String>>;
    async fn delete_student(&self, student_id: i64) -> Result<bool>;

    /// 考试管理方法
    async fn create_exam(&self, exam: NewExam) -> Result<Exam>;
    async fn get_exam_by_id(&self, exam_id: i64) -> Result<Option<Exam>>;
    async fn list_exams_with_pagination(&self, query: ExamListQuery) -> Result<ExamListResponse>;
    async fn update_exam(&self, exam_id: i64, update: UpdateExamRequest) -> Result<Option<Exam>>;
    async fn delete_exam(&self, exam_id: i64) -> Result<bool>;

    /// 文件管理方法
    async fn create_file(
        &self,
        download_token: &str,
        original_name: &str,
        stored_name: &str,
        file_size: i64,
        file_type: &str,
        user_id: i64,
    ) -> Result<File>;
    // 通过唯一 token 获取文件信息
    async fn get_file_by_token(&self, token: &str) -> Result<Option<File>>;

    /// 提交管理方法
    async fn create_submission(
        &self,
        exam_id: i64,
        student_id: i64,
        file_token: &str,
    ) -> Result<Submission>;
    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>>;
    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse>;
    async fn delete_submission(&self, submission_id: i64) -> Result<bool>;
    // 将提交置为 processing；已在处理中且未过期则返回 false
    async fn claim_submission_for_grading(
        &self,
        submission_id: i64,
        stale_before: i64,
    ) -> Result<bool>;
    async fn update_submission_status(
        &self,
        submission_id: i64,
        status: SubmissionStatus,
    ) -> Result<bool>;
    // 在同一事务中写入评分并将提交置为 graded
    async fn complete_grading(&self, grade: NewGrade) -> Result<Grade>;
    async fn get_grade_by_submission_id(&self, submission_id: i64) -> Result<Option<Grade>>;

    /// 审计日志方法
    async fn create_audit_log(&self, log: NewAuditLog) -> Result<AuditLog>;
    async fn list_audit_logs_with_pagination(
        &self,
        query: AuditLogListQuery,
    ) -> Result<AuditLogListResponse>;

    /// 统计方法
    async fn count_classes(&self, scope: StatsScope) -> Result<i64>;
    async fn count_students(&self, scope: StatsScope) -> Result<i64>;
    async fn count_exams(&self, scope: StatsScope) -> Result<i64>;
    async fn count_submissions_by_status(&self, scope: StatsScope)
    -> Result<SubmissionStatusCounts>;
    // (得分, 满分) 列表
    async fn list_grade_scores(&self, scope: StatsScope) -> Result<Vec<(f64, f64)>>;
    async fn count_profiles_by_role(&self, organization_id: Option<i64>) -> Result<Vec<RoleCount>>;
    async fn list_teacher_usage(&self, organization_id: i64) -> Result<Vec<TeacherUsageRow>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
