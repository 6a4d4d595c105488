//! 仪表盘统计查询
//!
//! 范围先解析为班级 ID 列表，再据此过滤学生、考试、提交与成绩。

use super::SeaOrmStorage;
use crate::entity::classes::{Column as ClassColumn, Entity as Classes};
use crate::entity::exams::{Column as ExamColumn, Entity as Exams};
use crate::entity::grades::{Column as GradeColumn, Entity as Grades};
use crate::entity::profiles::{Column as ProfileColumn, Entity as Profiles};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::errors::{GraderError, Result};
use crate::models::dashboard::{
    entities::{StatsScope, TeacherUsageRow},
    responses::{RoleCount, SubmissionStatusCounts},
};
use crate::models::submissions::entities::SubmissionStatus;
use crate::models::users::entities::UserRole;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};

fn db_err(what: &str) -> impl Fn(sea_orm::DbErr) -> GraderError + '_ {
    move |e| GraderError::database_operation(format!("{what}: {e}"))
}

impl SeaOrmStorage {
    /// None 表示全平台
    async fn scoped_class_ids(&self, scope: StatsScope) -> Result<Option<Vec<i64>>> {
        if scope.organization_id.is_none() && scope.teacher_id.is_none() {
            return Ok(None);
        }

        let mut select = Classes::find().select_only().column(ClassColumn::Id);
        if let Some(organization_id) = scope.organization_id {
            select = select.filter(ClassColumn::OrganizationId.eq(organization_id));
        }
        if let Some(teacher_id) = scope.teacher_id {
            select = select.filter(ClassColumn::TeacherId.eq(teacher_id));
        }

        let ids = select
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(db_err("查询班级范围失败"))?;
        Ok(Some(ids))
    }

    async fn scoped_exam_ids(&self, scope: StatsScope) -> Result<Option<Vec<i64>>> {
        let Some(class_ids) = self.scoped_class_ids(scope).await? else {
            return Ok(None);
        };
        if class_ids.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let ids = Exams::find()
            .select_only()
            .column(ExamColumn::Id)
            .filter(ExamColumn::ClassId.is_in(class_ids))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(db_err("查询考试范围失败"))?;
        Ok(Some(ids))
    }

    pub async fn count_classes_impl(&self, scope: StatsScope) -> Result<i64> {
        match self.scoped_class_ids(scope).await? {
            Some(ids) => Ok(ids.len() as i64),
            None => Ok(Classes::find()
                .count(&self.db)
                .await
                .map_err(db_err("统计班级失败"))? as i64),
        }
    }

    pub async fn count_students_impl(&self, scope: StatsScope) -> Result<i64> {
        let mut select = Students::find();
        if let Some(ids) = self.scoped_class_ids(scope).await? {
            if ids.is_empty() {
                return Ok(0);
            }
            select = select.filter(StudentColumn::ClassId.is_in(ids));
        }

        Ok(select
            .count(&self.db)
            .await
            .map_err(db_err("统计学生失败"))? as i64)
    }

    pub async fn count_exams_impl(&self, scope: StatsScope) -> Result<i64> {
        match self.scoped_exam_ids(scope).await? {
            Some(ids) => Ok(ids.len() as i64),
            None => Ok(Exams::find()
                .count(&self.db)
                .await
                .map_err(db_err("统计考试失败"))? as i64),
        }
    }

    pub async fn count_submissions_by_status_impl(
        &self,
        scope: StatsScope,
    ) -> Result<SubmissionStatusCounts> {
        let mut select = Submissions::find()
            .select_only()
            .column(SubmissionColumn::Status)
            .column_as(SubmissionColumn::Id.count(), "count")
            .group_by(SubmissionColumn::Status);

        if let Some(ids) = self.scoped_exam_ids(scope).await? {
            if ids.is_empty() {
                return Ok(SubmissionStatusCounts::default());
            }
            select = select.filter(SubmissionColumn::ExamId.is_in(ids));
        }

        let rows: Vec<(String, i64)> = select
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err("统计提交失败"))?;

        let mut counts = SubmissionStatusCounts::default();
        for (status, count) in rows {
            match status.as_str() {
                SubmissionStatus::PENDING => counts.pending += count,
                SubmissionStatus::PROCESSING => counts.processing += count,
                SubmissionStatus::GRADED => counts.graded += count,
                _ => {}
            }
        }
        Ok(counts)
    }

    /// (得分, 满分) 列表
    pub async fn list_grade_scores_impl(&self, scope: StatsScope) -> Result<Vec<(f64, f64)>> {
        let mut select = Grades::find()
            .select_only()
            .column(GradeColumn::ScoreObtained)
            .column(GradeColumn::ScorePossible);

        if let Some(ids) = self.scoped_exam_ids(scope).await? {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            select = select.filter(GradeColumn::ExamId.is_in(ids));
        }

        select
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err("查询成绩失败"))
    }

    pub async fn count_profiles_by_role_impl(
        &self,
        organization_id: Option<i64>,
    ) -> Result<Vec<RoleCount>> {
        let mut select = Profiles::find()
            .select_only()
            .column(ProfileColumn::Role)
            .column_as(ProfileColumn::UserId.count(), "count")
            .group_by(ProfileColumn::Role)
            .order_by_asc(ProfileColumn::Role);

        if let Some(organization_id) = organization_id {
            select = select.filter(ProfileColumn::OrganizationId.eq(organization_id));
        }

        let rows: Vec<(String, i64)> = select
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err("统计角色失败"))?;

        Ok(rows
            .into_iter()
            .map(|(role, count)| RoleCount { role, count })
            .collect())
    }

    /// 组织内教师的本期用量，按用量降序
    pub async fn list_teacher_usage_impl(&self, organization_id: i64) -> Result<Vec<TeacherUsageRow>> {
        let profiles = Profiles::find()
            .filter(ProfileColumn::OrganizationId.eq(organization_id))
            .filter(ProfileColumn::Role.eq(UserRole::TEACHER))
            .order_by_desc(ProfileColumn::MonthlyCreditsUsed)
            .order_by_asc(ProfileColumn::FullName)
            .all(&self.db)
            .await
            .map_err(db_err("查询教师用量失败"))?;

        Ok(profiles
            .into_iter()
            .map(|p| TeacherUsageRow {
                teacher_id: p.user_id,
                full_name: p.full_name,
                monthly_credits_used: p.monthly_credits_used,
                monthly_credit_limit: p.monthly_credit_limit,
            })
            .collect())
    }
}
