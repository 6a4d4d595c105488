pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::{Rejection, ServiceResult, storage_from_request};
use crate::models::ErrorCode;
use crate::models::exams::requests::{CreateExamRequest, ExamListParams, UpdateExamRequest};
use crate::storage::Storage;

pub struct ExamService {
    storage: Option<Arc<dyn Storage>>,
}

impl ExamService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    pub async fn list_exams(
        &self,
        request: &HttpRequest,
        class_id: i64,
        query: ExamListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_exams(self, request, class_id, query).await
    }

    pub async fn create_exam(
        &self,
        request: &HttpRequest,
        class_id: i64,
        data: CreateExamRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_exam(self, request, class_id, data).await
    }

    pub async fn get_exam(&self, request: &HttpRequest, exam_id: i64) -> ActixResult<HttpResponse> {
        get::get_exam(self, request, exam_id).await
    }

    pub async fn update_exam(
        &self,
        request: &HttpRequest,
        exam_id: i64,
        data: UpdateExamRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_exam(self, request, exam_id, data).await
    }

    pub async fn delete_exam(
        &self,
        request: &HttpRequest,
        exam_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::delete_exam(self, request, exam_id).await
    }
}

fn validate_title(title: &str) -> ServiceResult<String> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 200 {
        return Err(Rejection::bad_request(
            ErrorCode::BadRequest,
            "Title must be between 1 and 200 characters",
        ));
    }
    Ok(title.to_string())
}
