use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::load_submission;
use crate::services::{Rejection, ServiceResult, current_user, respond};

pub async fn get_grade(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    respond(grade(service, request, submission_id).await)
}

async fn grade(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    load_submission(&storage, &user, submission_id).await?;

    let grade = storage
        .get_grade_by_submission_id(submission_id)
        .await?
        .ok_or_else(|| Rejection::not_found(ErrorCode::GradeNotFound, "Grade not found"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(grade, "Grade retrieved successfully")))
}
