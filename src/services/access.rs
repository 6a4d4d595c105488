//! 资源访问控制
//!
//! 超级管理员可访问全部资源；admin / director 可访问本组织资源；
//! 教师只能访问自己负责的班级及其下的学生、考试与提交。

use std::sync::Arc;

use super::{Rejection, ServiceResult};
use crate::models::ErrorCode;
use crate::models::classes::entities::Class;
use crate::models::exams::entities::Exam;
use crate::models::submissions::entities::Submission;
use crate::models::users::entities::{User, UserRole};
use crate::storage::Storage;

/// 是否可以访问某个组织下由 teacher_id 负责的资源
pub fn can_access(user: &User, organization_id: i64, teacher_id: i64) -> bool {
    match user.role() {
        UserRole::Superadmin => true,
        UserRole::Admin | UserRole::Director => user.manages_organization(organization_id),
        UserRole::Teacher => {
            user.id == teacher_id && user.organization_id() == Some(organization_id)
        }
        UserRole::InstitutionalManager => false,
    }
}

/// 组织级访问：超级管理员或本组织管理员
pub fn ensure_organization_access(user: &User, organization_id: i64) -> ServiceResult<()> {
    if user.is_superadmin() || user.manages_organization(organization_id) {
        Ok(())
    } else {
        Err(Rejection::forbidden(
            ErrorCode::Forbidden,
            "You do not have access to this organization",
        ))
    }
}

pub async fn load_class(
    storage: &Arc<dyn Storage>,
    user: &User,
    class_id: i64,
) -> ServiceResult<Class> {
    let class = storage
        .get_class_by_id(class_id)
        .await?
        .ok_or_else(|| Rejection::not_found(ErrorCode::ClassNotFound, "Class not found"))?;

    if !can_access(user, class.organization_id, class.teacher_id) {
        return Err(Rejection::forbidden(
            ErrorCode::ClassPermissionDenied,
            "You do not have permission to access this class",
        ));
    }
    Ok(class)
}

pub async fn load_exam(
    storage: &Arc<dyn Storage>,
    user: &User,
    exam_id: i64,
) -> ServiceResult<Exam> {
    let exam = storage
        .get_exam_by_id(exam_id)
        .await?
        .ok_or_else(|| Rejection::not_found(ErrorCode::ExamNotFound, "Exam not found"))?;

    if !can_access(user, exam.organization_id, exam.teacher_id) {
        return Err(Rejection::forbidden(
            ErrorCode::Forbidden,
            "You do not have permission to access this exam",
        ));
    }
    Ok(exam)
}

/// 提交及其所属考试
pub async fn load_submission(
    storage: &Arc<dyn Storage>,
    user: &User,
    submission_id: i64,
) -> ServiceResult<(Submission, Exam)> {
    let submission = storage
        .get_submission_by_id(submission_id)
        .await?
        .ok_or_else(|| {
            Rejection::not_found(ErrorCode::SubmissionNotFound, "Submission not found")
        })?;

    let exam = storage
        .get_exam_by_id(submission.exam_id)
        .await?
        .ok_or_else(|| Rejection::not_found(ErrorCode::ExamNotFound, "Exam not found"))?;

    if !can_access(user, exam.organization_id, exam.teacher_id) {
        return Err(Rejection::forbidden(
            ErrorCode::Forbidden,
            "You do not have permission to access this submission",
        ));
    }
    Ok((submission, exam))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{UserProfile, UserStatus};

    fn user(id: i64, role: UserRole, organization_id: Option<i64>) -> User {
        let now = chrono::Utc::now();
        User {
            id,
            email: format!("u{id}@school.test"),
            password_hash: String::new(),
            status: UserStatus::Active,
            profile: UserProfile {
                full_name: format!("User {id}"),
                organization_id,
                role,
                monthly_credit_limit: 100,
                monthly_credits_used: 0,
            },
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_teacher_only_sees_own_resources() {
        let teacher = user(7, UserRole::Teacher, Some(1));
        assert!(can_access(&teacher, 1, 7));
        assert!(!can_access(&teacher, 1, 8));
        assert!(!can_access(&teacher, 2, 7));
    }

    #[test]
    fn test_managers_scoped_to_organization() {
        let director = user(2, UserRole::Director, Some(1));
        assert!(can_access(&director, 1, 99));
        assert!(!can_access(&director, 2, 99));
        assert!(ensure_organization_access(&director, 1).is_ok());
        assert!(ensure_organization_access(&director, 2).is_err());

        let root = user(1, UserRole::Superadmin, None);
        assert!(can_access(&root, 5, 5));
        assert!(ensure_organization_access(&root, 42).is_ok());

        let analyst = user(3, UserRole::InstitutionalManager, None);
        assert!(!can_access(&analyst, 1, 1));
    }
}
