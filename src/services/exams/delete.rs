use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ExamService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::load_exam;
use crate::services::{Rejection, ServiceResult, current_user, respond};

pub async fn delete_exam(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
) -> ActixResult<HttpResponse> {
    respond(delete(service, request, exam_id).await)
}

async fn delete(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    load_exam(&storage, &user, exam_id).await?;

    if !storage.delete_exam(exam_id).await? {
        return Err(Rejection::not_found(ErrorCode::ExamNotFound, "Exam not found"));
    }
    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Exam deleted successfully")))
}
