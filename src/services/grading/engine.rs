//! 积分计量的评分流程
//!
//! 1. 读取提交 PDF，按页数计算消耗；
//! 2. 占用提交（置为 processing）；
//! 3. 原子预留积分（组织余额 + 教师月度额度）；
//! 4. 调用模型并严格解析报告；
//! 5. 写入评分。
//!
//! 第 4、5 步失败时退还积分并恢复提交原状态。
//! 整个流程在独立任务中执行，请求被取消不会中断补偿。

use std::sync::Arc;

use tracing::{error, info, warn};

use super::{GradingModel, pdf, report};
use crate::errors::{GraderError, Result};
use crate::models::audit_logs::entities::{NewAuditLog, actions};
use crate::models::credits::entities::CreditReservation;
use crate::models::exams::entities::Exam;
use crate::models::grading::entities::NewGrade;
use crate::models::grading::report::EvaluationEnvelope;
use crate::models::grading::responses::GradeSubmissionResponse;
use crate::models::submissions::entities::{Submission, SubmissionStatus};
use crate::storage::{BlobStore, Storage};

/// processing 占用的默认有效期（秒）
pub const DEFAULT_CLAIM_TTL_SECS: i64 = 600;

#[derive(Clone)]
pub struct GradingEngine {
    storage: Arc<dyn Storage>,
    blobs: Arc<dyn BlobStore>,
    model: Arc<dyn GradingModel>,
    claim_ttl_secs: i64,
}

impl GradingEngine {
    pub fn new(
        storage: Arc<dyn Storage>,
        blobs: Arc<dyn BlobStore>,
        model: Arc<dyn GradingModel>,
    ) -> Self {
        Self {
            storage,
            blobs,
            model,
            claim_ttl_secs: DEFAULT_CLAIM_TTL_SECS,
        }
    }

    /// 超过该时长仍为 processing 的提交可被重新评分
    pub fn with_claim_ttl(mut self, secs: i64) -> Self {
        self.claim_ttl_secs = secs;
        self
    }

    async fn load_pdf(&self, token: &str) -> Result<Vec<u8>> {
        let file = self
            .storage
            .get_file_by_token(token)
            .await?
            .ok_or_else(|| GraderError::file_not_found(format!("File {token} not found")))?;
        self.blobs.get(&file.stored_name).await
    }

    /// 对提交执行一次评分，调用方负责权限校验
    ///
    /// 调用方的 future 被丢弃后，后台任务仍会完成评分或退还积分。
    pub async fn grade(
        &self,
        submission: &Submission,
        exam: &Exam,
    ) -> Result<GradeSubmissionResponse> {
        let engine = self.clone();
        let submission = submission.clone();
        let exam = exam.clone();
        tokio::spawn(async move { engine.run(&submission, &exam).await })
            .await
            .map_err(|e| GraderError::background_task(format!("Grading task failed: {e}")))?
    }

    async fn run(
        &self,
        submission: &Submission,
        exam: &Exam,
    ) -> Result<GradeSubmissionResponse> {
        let solution_token = exam
            .solution_file_token
            .as_deref()
            .ok_or_else(|| GraderError::validation("Exam has no solution file"))?;

        let submission_pdf = self.load_pdf(&submission.file_token).await?;
        let cost = pdf::grading_cost(pdf::count_pages(&submission_pdf)?);
        let solution_pdf = self.load_pdf(solution_token).await?;

        let stale_before = chrono::Utc::now()
            .timestamp()
            .saturating_sub(self.claim_ttl_secs);
        if !self
            .storage
            .claim_submission_for_grading(submission.id, stale_before)
            .await?
        {
            return Err(GraderError::conflict("Submission is already being graded"));
        }

        let reservation = match self
            .storage
            .reserve_grading_credits(exam.organization_id, exam.teacher_id, submission.id, cost)
            .await
        {
            Ok(reservation) => reservation,
            Err(e) => {
                self.restore_status(submission).await;
                return Err(e);
            }
        };

        info!(
            "Reserved {} credits for submission {} (organization {}, teacher {})",
            cost, submission.id, exam.organization_id, exam.teacher_id
        );

        let envelope = match self
            .evaluate(exam, &solution_pdf, &submission_pdf)
            .await
        {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Grading submission {} failed: {}", submission.id, e);
                self.compensate(submission, &reservation).await;
                return Err(e);
            }
        };

        let (score_obtained, score_possible) = report::scores(&envelope);
        let feedback = serde_json::to_value(&envelope)?;
        let grade = match self
            .storage
            .complete_grading(NewGrade {
                submission_id: submission.id,
                exam_id: exam.id,
                student_id: submission.student_id,
                score_obtained,
                score_possible,
                ai_feedback: feedback.to_string(),
            })
            .await
        {
            Ok(grade) => grade,
            Err(e) => {
                self.compensate(submission, &reservation).await;
                return Err(e);
            }
        };

        self.record(
            NewAuditLog::new(actions::SUBMISSION_GRADE, "submission", Some(submission.id))
                .actor(exam.teacher_id, Some(exam.organization_id))
                .details(serde_json::json!({
                    "grade_id": grade.id,
                    "credits_used": cost,
                    "score_obtained": score_obtained,
                    "score_possible": score_possible,
                })),
        )
        .await;

        Ok(GradeSubmissionResponse {
            feedback,
            grade_id: grade.id,
            credits_used: reservation.cost,
            credits_remaining: reservation.credits_remaining,
            monthly_credits_used: reservation.monthly_credits_used,
            monthly_credit_limit: reservation.monthly_credit_limit,
        })
    }

    async fn evaluate(
        &self,
        exam: &Exam,
        solution_pdf: &[u8],
        submission_pdf: &[u8],
    ) -> Result<EvaluationEnvelope> {
        let prompt = report::build_prompt(exam);
        let text = self
            .model
            .evaluate(&prompt, solution_pdf, submission_pdf)
            .await?;
        report::parse_report(&text)
    }

    /// 退还积分并恢复提交状态
    async fn compensate(&self, submission: &Submission, reservation: &CreditReservation) {
        if let Err(e) = self.storage.refund_grading_credits(reservation).await {
            error!(
                "Failed to refund {} credits for submission {}: {}",
                reservation.cost, submission.id, e
            );
            self.record(
                NewAuditLog::new(
                    actions::CREDITS_REFUND_FAILED,
                    "submission",
                    Some(submission.id),
                )
                .actor(reservation.teacher_id, Some(reservation.organization_id))
                .details(serde_json::json!({
                    "cost": reservation.cost,
                    "error": e.message(),
                })),
            )
            .await;
        }
        self.restore_status(submission).await;
    }

    /// 已有评分记录则恢复为 graded，否则为 pending
    async fn restore_status(&self, submission: &Submission) {
        let previous = match self.storage.get_grade_by_submission_id(submission.id).await {
            Ok(Some(_)) => SubmissionStatus::Graded,
            Ok(None) => SubmissionStatus::Pending,
            Err(_) if submission.status == SubmissionStatus::Graded => SubmissionStatus::Graded,
            Err(_) => SubmissionStatus::Pending,
        };
        if let Err(e) = self
            .storage
            .update_submission_status(submission.id, previous)
            .await
        {
            error!(
                "Failed to restore status of submission {}: {}",
                submission.id, e
            );
        }
    }

    async fn record(&self, log: NewAuditLog) {
        if let Err(e) = self.storage.create_audit_log(log).await {
            warn!("Failed to write audit log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::credits::entities::CreditTransactionKind;
    use crate::models::credits::requests::CreditTransactionListQuery;
    use crate::test_support::{Fixture, StubModel, VALID_REPORT};
    use std::time::Duration;

    /// 延迟返回的模型，模拟耗时较长的评分调用
    struct SlowModel {
        delay: Duration,
        inner: StubModel,
    }

    #[async_trait::async_trait]
    impl GradingModel for SlowModel {
        async fn evaluate(
            &self,
            prompt: &str,
            solution_pdf: &[u8],
            submission_pdf: &[u8],
        ) -> Result<String> {
            tokio::time::sleep(self.delay).await;
            self.inner
                .evaluate(prompt, solution_pdf, submission_pdf)
                .await
        }
    }

    fn slow_engine(fixture: &Fixture, inner: StubModel) -> GradingEngine {
        GradingEngine::new(
            fixture.storage.clone(),
            fixture.blobs.clone(),
            Arc::new(SlowModel {
                delay: Duration::from_millis(300),
                inner,
            }),
        )
    }

    async fn wait_for_status(
        fixture: &Fixture,
        submission_id: i64,
        status: SubmissionStatus,
    ) -> Submission {
        for _ in 0..100 {
            let stored = fixture
                .storage
                .get_submission_by_id(submission_id)
                .await
                .unwrap()
                .unwrap();
            if stored.status == status {
                return stored;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("submission {submission_id} never reached {status:?}");
    }

    fn engine_with(fixture: &Fixture, model: StubModel) -> GradingEngine {
        GradingEngine::new(
            fixture.storage.clone(),
            fixture.blobs.clone(),
            Arc::new(model),
        )
    }

    async fn ledger_kinds(fixture: &Fixture) -> Vec<CreditTransactionKind> {
        fixture
            .storage
            .list_credit_transactions(CreditTransactionListQuery {
                organization_id: fixture.organization.id,
                size: Some(100),
                ..Default::default()
            })
            .await
            .unwrap()
            .items
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[tokio::test]
    async fn test_insufficient_credits_mutates_nothing() {
        let fixture = Fixture::new(10, 100).await;
        let (submission, exam) = fixture.submission_with_pages(12).await;
        let model = StubModel::replying(VALID_REPORT);
        let calls = model.calls();
        let engine = engine_with(&fixture, model);

        let err = engine.grade(&submission, &exam).await.unwrap_err();
        assert!(matches!(err, GraderError::InsufficientCredits(_)));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);

        let org = fixture
            .storage
            .get_organization_by_id(fixture.organization.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(org.credits_remaining, 10);
        let teacher = fixture
            .storage
            .get_user_by_id(fixture.teacher.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(teacher.profile.monthly_credits_used, 0);
        let stored = fixture
            .storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Pending);
        assert!(ledger_kinds(&fixture).await.is_empty());
    }

    #[tokio::test]
    async fn test_successful_grading_deducts_pages() {
        let fixture = Fixture::new(10, 5).await;
        let (submission, exam) = fixture.submission_with_pages(3).await;
        let engine = engine_with(&fixture, StubModel::replying(VALID_REPORT));

        let response = engine.grade(&submission, &exam).await.unwrap();
        assert_eq!(response.credits_used, 3);
        assert_eq!(response.credits_remaining, 7);
        assert_eq!(response.monthly_credits_used, 3);
        assert_eq!(response.monthly_credit_limit, 5);
        assert_eq!(
            response.feedback["informe_evaluacion"]["resumen_general"]["puntuacion_obtenida"],
            7.5
        );

        let stored = fixture
            .storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Graded);
        assert!(stored.ai_feedback.is_some());

        let grade = fixture
            .storage
            .get_grade_by_submission_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(grade.id, response.grade_id);
        assert_eq!(grade.score_possible, 10.0);
        assert_eq!(ledger_kinds(&fixture).await, vec![CreditTransactionKind::Grading]);
    }

    #[tokio::test]
    async fn test_monthly_limit_blocks_teacher() {
        let fixture = Fixture::new(100, 2).await;
        let (submission, exam) = fixture.submission_with_pages(3).await;
        let engine = engine_with(&fixture, StubModel::replying(VALID_REPORT));

        let err = engine.grade(&submission, &exam).await.unwrap_err();
        assert!(matches!(err, GraderError::MonthlyLimitExceeded(_)));
        let org = fixture
            .storage
            .get_organization_by_id(fixture.organization.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(org.credits_remaining, 100);
    }

    #[tokio::test]
    async fn test_ai_failure_refunds_and_resets_status() {
        let fixture = Fixture::new(10, 100).await;
        let (submission, exam) = fixture.submission_with_pages(3).await;
        let engine = engine_with(&fixture, StubModel::failing());

        let err = engine.grade(&submission, &exam).await.unwrap_err();
        assert!(matches!(err, GraderError::AiService(_)));

        let org = fixture
            .storage
            .get_organization_by_id(fixture.organization.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(org.credits_remaining, 10);
        let teacher = fixture
            .storage
            .get_user_by_id(fixture.teacher.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(teacher.profile.monthly_credits_used, 0);
        let stored = fixture
            .storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Pending);

        let mut kinds = ledger_kinds(&fixture).await;
        kinds.sort_by_key(|k| k.to_string());
        assert_eq!(
            kinds,
            vec![CreditTransactionKind::Grading, CreditTransactionKind::Refund]
        );
    }

    #[tokio::test]
    async fn test_invalid_report_is_refunded() {
        let fixture = Fixture::new(10, 100).await;
        let (submission, exam) = fixture.submission_with_pages(2).await;
        let engine = engine_with(&fixture, StubModel::replying("```json\n{\"nota\": 7}\n```"));

        let err = engine.grade(&submission, &exam).await.unwrap_err();
        assert!(matches!(err, GraderError::AiResponseInvalid(_)));
        let org = fixture
            .storage
            .get_organization_by_id(fixture.organization.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(org.credits_remaining, 10);
        assert!(
            fixture
                .storage
                .get_grade_by_submission_id(submission.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_processing_submission_is_rejected() {
        let fixture = Fixture::new(10, 100).await;
        let (submission, exam) = fixture.submission_with_pages(1).await;
        fixture
            .storage
            .update_submission_status(submission.id, SubmissionStatus::Processing)
            .await
            .unwrap();
        let engine = engine_with(&fixture, StubModel::replying(VALID_REPORT));

        let err = engine.grade(&submission, &exam).await.unwrap_err();
        assert!(matches!(err, GraderError::Conflict(_)));
        let org = fixture
            .storage
            .get_organization_by_id(fixture.organization.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(org.credits_remaining, 10);
    }

    #[tokio::test]
    async fn test_unparseable_submission_pdf() {
        let fixture = Fixture::new(10, 100).await;
        let (submission, exam) = fixture.submission_with_bytes(b"%PDF-1.7 broken".to_vec()).await;
        let engine = engine_with(&fixture, StubModel::replying(VALID_REPORT));

        let err = engine.grade(&submission, &exam).await.unwrap_err();
        assert!(matches!(err, GraderError::PdfInvalid(_)));
    }

    #[tokio::test]
    async fn test_dropped_caller_still_completes_grading() {
        let fixture = Fixture::new(10, 5).await;
        let (submission, exam) = fixture.submission_with_pages(3).await;
        let engine = slow_engine(&fixture, StubModel::replying(VALID_REPORT));

        // 客户端断开：调用方 future 在模型返回前被丢弃
        let dropped =
            tokio::time::timeout(Duration::from_millis(50), engine.grade(&submission, &exam)).await;
        assert!(dropped.is_err());

        wait_for_status(&fixture, submission.id, SubmissionStatus::Graded).await;
        assert!(
            fixture
                .storage
                .get_grade_by_submission_id(submission.id)
                .await
                .unwrap()
                .is_some()
        );
        let org = fixture
            .storage
            .get_organization_by_id(fixture.organization.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(org.credits_remaining, 7);
    }

    #[tokio::test]
    async fn test_dropped_caller_still_refunds_on_failure() {
        let fixture = Fixture::new(10, 5).await;
        let (submission, exam) = fixture.submission_with_pages(3).await;
        let engine = slow_engine(&fixture, StubModel::failing());

        let dropped =
            tokio::time::timeout(Duration::from_millis(50), engine.grade(&submission, &exam)).await;
        assert!(dropped.is_err());

        for _ in 0..100 {
            if ledger_kinds(&fixture).await.contains(&CreditTransactionKind::Refund) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        wait_for_status(&fixture, submission.id, SubmissionStatus::Pending).await;

        let mut kinds = ledger_kinds(&fixture).await;
        kinds.sort_by_key(|k| k.to_string());
        assert_eq!(
            kinds,
            vec![CreditTransactionKind::Grading, CreditTransactionKind::Refund]
        );
        let org = fixture
            .storage
            .get_organization_by_id(fixture.organization.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(org.credits_remaining, 10);

        // 之后可以重新评分
        let retry = engine_with(&fixture, StubModel::replying(VALID_REPORT));
        let response = retry.grade(&submission, &exam).await.unwrap();
        assert_eq!(response.credits_remaining, 7);
    }

    #[tokio::test]
    async fn test_stale_processing_claim_is_reclaimed() {
        let fixture = Fixture::new(10, 5).await;
        let (submission, exam) = fixture.submission_with_pages(1).await;
        fixture
            .storage
            .update_submission_status(submission.id, SubmissionStatus::Processing)
            .await
            .unwrap();

        // 占用有效期为负：现有的 processing 记录已过期
        let engine = engine_with(&fixture, StubModel::replying(VALID_REPORT)).with_claim_ttl(-5);
        let response = engine.grade(&submission, &exam).await.unwrap();
        assert_eq!(response.credits_used, 1);

        let stored = fixture
            .storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Graded);
    }

    #[tokio::test]
    async fn test_missing_file_and_missing_tenant_are_distinct() {
        let fixture = Fixture::new(10, 5).await;
        let engine = engine_with(&fixture, StubModel::replying(VALID_REPORT));

        let (mut submission, exam) = fixture.submission_with_pages(1).await;
        submission.file_token = "no-such-token".to_string();
        let err = engine.grade(&submission, &exam).await.unwrap_err();
        assert!(matches!(err, GraderError::FileNotFound(_)));

        let (submission, mut exam) = fixture.submission_with_pages(1).await;
        exam.organization_id = 9_999;
        let err = engine.grade(&submission, &exam).await.unwrap_err();
        assert!(matches!(err, GraderError::NotFound(_)));

        let stored = fixture
            .storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Pending);
    }
}
