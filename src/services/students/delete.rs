use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudentService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::load_class;
use crate::services::{Rejection, ServiceResult, current_user, respond};

pub async fn delete_student(
    service: &StudentService,
    request: &HttpRequest,
    class_id: i64,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    respond(delete(service, request, class_id, student_id).await)
}

async fn delete(
    service: &StudentService,
    request: &HttpRequest,
    class_id: i64,
    student_id: i64,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    load_class(&storage, &user, class_id).await?;

    let not_found = || Rejection::not_found(ErrorCode::StudentNotFound, "Student not found");
    let student = storage
        .get_student_by_id(student_id)
        .await?
        .filter(|student| student.class_id == class_id)
        .ok_or_else(not_found)?;

    if !storage.delete_student(student.id).await? {
        return Err(not_found());
    }
    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Student deleted successfully")))
}
