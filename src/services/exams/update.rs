use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ExamService, validate_title};
use crate::models::exams::requests::UpdateExamRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::load_exam;
use crate::services::files::require_pdf_file;
use crate::services::{Rejection, ServiceResult, current_user, respond};

pub async fn update_exam(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
    data: UpdateExamRequest,
) -> ActixResult<HttpResponse> {
    respond(update(service, request, exam_id, data).await)
}

async fn update(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
    mut data: UpdateExamRequest,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    load_exam(&storage, &user, exam_id).await?;

    data.title = data.title.as_deref().map(validate_title).transpose()?;
    if let Some(token) = &data.solution_file_token {
        require_pdf_file(&storage, token).await?;
    }

    let exam = storage
        .update_exam(exam_id, data)
        .await?
        .ok_or_else(|| Rejection::not_found(ErrorCode::ExamNotFound, "Exam not found"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(exam, "Exam updated successfully")))
}
