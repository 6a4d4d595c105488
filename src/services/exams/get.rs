use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ExamService;
use crate::models::ApiResponse;
use crate::services::access::load_exam;
use crate::services::{ServiceResult, current_user, respond};

pub async fn get_exam(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
) -> ActixResult<HttpResponse> {
    respond(get(service, request, exam_id).await)
}

async fn get(service: &ExamService, request: &HttpRequest, exam_id: i64) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    let exam = load_exam(&storage, &user, exam_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(exam, "Exam retrieved successfully")))
}
