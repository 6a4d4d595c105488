use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{ExamService, validate_title};
use crate::models::ApiResponse;
use crate::models::exams::requests::{CreateExamRequest, NewExam};
use crate::services::access::load_class;
use crate::services::files::require_pdf_file;
use crate::services::{ServiceResult, current_user, respond};

pub async fn create_exam(
    service: &ExamService,
    request: &HttpRequest,
    class_id: i64,
    data: CreateExamRequest,
) -> ActixResult<HttpResponse> {
    respond(create(service, request, class_id, data).await)
}

async fn create(
    service: &ExamService,
    request: &HttpRequest,
    class_id: i64,
    data: CreateExamRequest,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    let class = load_class(&storage, &user, class_id).await?;

    let title = validate_title(&data.title)?;
    if let Some(token) = &data.solution_file_token {
        require_pdf_file(&storage, token).await?;
    }

    let exam = storage
        .create_exam(NewExam {
            class_id: class.id,
            organization_id: class.organization_id,
            teacher_id: class.teacher_id,
            title,
            exam_type: data.exam_type,
            solution_file_token: data.solution_file_token,
        })
        .await?;
    info!("Exam {} created in class {}", exam.id, class.id);

    Ok(HttpResponse::Created().json(ApiResponse::success(exam, "Exam created successfully")))
}
