pub mod download;
pub mod upload;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::{Rejection, ServiceResult, storage_from_request};
use crate::models::ErrorCode;
use crate::models::files::entities::File;
use crate::storage::Storage;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

pub struct FileService {
    storage: Option<Arc<dyn Storage>>,
}

impl FileService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    // Handle file upload
    pub async fn handle_upload(
        &self,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        upload::handle_upload(self, request, payload).await
    }

    // Handle file download
    pub async fn handle_download(
        &self,
        request: &HttpRequest,
        file_token: String,
    ) -> ActixResult<HttpResponse> {
        download::handle_download(self, request, file_token).await
    }
}

/// 文件令牌必须指向已上传的 PDF
pub(crate) async fn require_pdf_file(
    storage: &Arc<dyn Storage>,
    token: &str,
) -> ServiceResult<File> {
    let file = storage
        .get_file_by_token(token)
        .await?
        .ok_or_else(|| Rejection::not_found(ErrorCode::FileNotFound, "File not found"))?;
    if file.file_type != PDF_CONTENT_TYPE {
        return Err(Rejection::bad_request(
            ErrorCode::FileTypeNotAllowed,
            "The referenced file is not a PDF",
        ));
    }
    Ok(file)
}
