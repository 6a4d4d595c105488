use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::ApiResponse;
use crate::models::submissions::responses::SubmissionDetailResponse;
use crate::services::access::load_submission;
use crate::services::{ServiceResult, current_user, respond};

pub async fn get_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    respond(detail(service, request, submission_id).await)
}

async fn detail(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    let (submission, _) = load_submission(&storage, &user, submission_id).await?;

    let student = storage.get_student_by_id(submission.student_id).await?;
    let grade = storage.get_grade_by_submission_id(submission.id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        SubmissionDetailResponse {
            submission,
            student,
            grade,
        },
        "Submission retrieved successfully",
    )))
}
