use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::SubmissionService;
use crate::models::submissions::requests::CreateSubmissionRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::load_exam;
use crate::services::files::require_pdf_file;
use crate::services::{Rejection, ServiceResult, current_user, respond};

pub async fn create_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    exam_id: i64,
    data: CreateSubmissionRequest,
) -> ActixResult<HttpResponse> {
    respond(create(service, request, exam_id, data).await)
}

async fn create(
    service: &SubmissionService,
    request: &HttpRequest,
    exam_id: i64,
    data: CreateSubmissionRequest,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    let exam = load_exam(&storage, &user, exam_id).await?;

    // 学生必须属于考试所在班级
    storage
        .get_student_by_id(data.student_id)
        .await?
        .filter(|student| student.class_id == exam.class_id)
        .ok_or_else(|| {
            Rejection::not_found(
                ErrorCode::StudentNotFound,
                "Student not found in the exam's class",
            )
        })?;
    require_pdf_file(&storage, &data.file_token).await?;

    let submission = storage
        .create_submission(exam.id, data.student_id, &data.file_token)
        .await?;
    info!(
        "Submission {} created for exam {} by {}",
        submission.id, exam.id, user.id
    );

    Ok(HttpResponse::Created().json(ApiResponse::success(
        submission,
        "Submission created successfully",
    )))
}
