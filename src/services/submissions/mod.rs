pub mod create;
pub mod delete;
pub mod detail;
pub mod grade;
pub mod list;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::{ServiceResult, storage_from_request};
use crate::models::submissions::requests::{CreateSubmissionRequest, SubmissionListParams};
use crate::storage::Storage;

pub struct SubmissionService {
    storage: Option<Arc<dyn Storage>>,
}

impl SubmissionService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    // 为考试创建提交（状态 pending）
    pub async fn create_submission(
        &self,
        request: &HttpRequest,
        exam_id: i64,
        data: CreateSubmissionRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_submission(self, request, exam_id, data).await
    }

    pub async fn list_submissions(
        &self,
        request: &HttpRequest,
        exam_id: i64,
        query: SubmissionListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_submissions(self, request, exam_id, query).await
    }

    // 提交详情（含学生与评分）
    pub async fn get_submission(
        &self,
        request: &HttpRequest,
        submission_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::get_submission(self, request, submission_id).await
    }

    pub async fn delete_submission(
        &self,
        request: &HttpRequest,
        submission_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::delete_submission(self, request, submission_id).await
    }

    pub async fn get_grade(
        &self,
        request: &HttpRequest,
        submission_id: i64,
    ) -> ActixResult<HttpResponse> {
        grade::get_grade(self, request, submission_id).await
    }
}
