use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::submissions::entities::SubmissionStatus;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::load_submission;
use crate::services::{Rejection, ServiceResult, current_user, respond};

pub async fn delete_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    respond(delete(service, request, submission_id).await)
}

async fn delete(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    let (submission, _) = load_submission(&storage, &user, submission_id).await?;

    // 评分进行中的提交不能删除
    if submission.status == SubmissionStatus::Processing {
        return Err(Rejection::conflict(
            ErrorCode::SubmissionAlreadyProcessing,
            "Submission is being graded",
        ));
    }
    if !storage.delete_submission(submission_id).await? {
        return Err(Rejection::not_found(
            ErrorCode::SubmissionNotFound,
            "Submission not found",
        ));
    }
    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Submission deleted successfully")))
}
