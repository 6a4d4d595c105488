use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{StudentService, normalize_student};
use crate::models::students::requests::CreateStudentRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::load_class;
use crate::services::{Rejection, ServiceResult, current_user, respond};

pub async fn create_student(
    service: &StudentService,
    request: &HttpRequest,
    class_id: i64,
    data: CreateStudentRequest,
) -> ActixResult<HttpResponse> {
    respond(create(service, request, class_id, data).await)
}

async fn create(
    service: &StudentService,
    request: &HttpRequest,
    class_id: i64,
    data: CreateStudentRequest,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    load_class(&storage, &user, class_id).await?;

    let student = normalize_student(data).map_err(|(field, msg)| {
        let code = if field == "full_name" {
            ErrorCode::UserNameInvalid
        } else {
            ErrorCode::UserEmailInvalid
        };
        Rejection::bad_request(code, format!("{field}: {msg}"))
    })?;

    let existing = storage.list_student_emails(class_id).await?;
    if existing.contains(&student.student_email) {
        return Err(Rejection::conflict(
            ErrorCode::StudentAlreadyExists,
            "A student with this email already exists in the class",
        ));
    }

    let student = storage.create_student(class_id, student).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(student, "Student created successfully")))
}
