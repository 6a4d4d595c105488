use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::GradingService;
use crate::errors::GraderError;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::load_submission;
use crate::services::{Rejection, ServiceResult, current_user, respond, storage_from_request};

pub async fn grade_submission(
    service: &GradingService,
    request: &HttpRequest,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    respond(grade(service, request, submission_id).await)
}

async fn grade(
    service: &GradingService,
    request: &HttpRequest,
    submission_id: i64,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = storage_from_request(request)?;
    let (submission, exam) = load_submission(&storage, &user, submission_id).await?;

    if exam.solution_file_token.is_none() {
        return Err(Rejection::bad_request(
            ErrorCode::ExamSolutionMissing,
            "Exam has no solution file",
        ));
    }

    let engine = service.get_engine(request)?;
    let result = engine.grade(&submission, &exam).await.map_err(|e| match e {
        GraderError::Conflict(msg) => {
            Rejection::conflict(ErrorCode::SubmissionAlreadyProcessing, msg)
        }
        other => other.into(),
    })?;

    info!(
        "Submission {} graded by user {} ({} credits)",
        submission_id, user.id, result.credits_used
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(result, "Submission graded successfully")))
}
