pub mod create;
pub mod delete;
pub mod import;
pub mod list;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::{ServiceResult, storage_from_request};
use crate::models::students::requests::{CreateStudentRequest, StudentListParams};
use crate::storage::Storage;
use crate::utils::validate::{validate_email, validate_full_name};

pub struct StudentService {
    storage: Option<Arc<dyn Storage>>,
}

impl StudentService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    pub async fn list_students(
        &self,
        request: &HttpRequest,
        class_id: i64,
        query: StudentListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_students(self, request, class_id, query).await
    }

    pub async fn create_student(
        &self,
        request: &HttpRequest,
        class_id: i64,
        data: CreateStudentRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_student(self, request, class_id, data).await
    }

    pub async fn delete_student(
        &self,
        request: &HttpRequest,
        class_id: i64,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::delete_student(self, request, class_id, student_id).await
    }

    // CSV 批量导入学生
    pub async fn import_students(
        &self,
        request: &HttpRequest,
        class_id: i64,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        import::import_students(self, request, class_id, payload).await
    }
}

/// 规范化并校验学生信息，返回出错的字段与原因
pub(crate) fn normalize_student(
    data: CreateStudentRequest,
) -> Result<CreateStudentRequest, (&'static str, &'static str)> {
    let full_name = data.full_name.trim().to_string();
    validate_full_name(&full_name).map_err(|msg| ("full_name", msg))?;

    let student_email = data.student_email.trim().to_lowercase();
    validate_email(&student_email).map_err(|msg| ("student_email", msg))?;

    let tutor_email = data
        .tutor_email
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty());
    if let Some(email) = &tutor_email {
        validate_email(email).map_err(|msg| ("tutor_email", msg))?;
    }

    Ok(CreateStudentRequest {
        full_name,
        student_email,
        tutor_email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, tutor: Option<&str>) -> CreateStudentRequest {
        CreateStudentRequest {
            full_name: name.to_string(),
            student_email: email.to_string(),
            tutor_email: tutor.map(str::to_string),
        }
    }

    #[test]
    fn test_normalize_student() {
        let student = normalize_student(request("  Ana  ", " Ana@School.Test ", Some(""))).unwrap();
        assert_eq!(student.full_name, "Ana");
        assert_eq!(student.student_email, "ana@school.test");
        assert_eq!(student.tutor_email, None);
    }

    #[test]
    fn test_normalize_student_rejects_invalid_fields() {
        assert_eq!(
            normalize_student(request("", "a@b.test", None)).unwrap_err().0,
            "full_name"
        );
        assert_eq!(
            normalize_student(request("Ana", "not-an-email", None)).unwrap_err().0,
            "student_email"
        );
        assert_eq!(
            normalize_student(request("Ana", "a@b.test", Some("bad"))).unwrap_err().0,
            "tutor_email"
        );
    }
}
