use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};
use uuid::Uuid;

use super::{FileService, PDF_CONTENT_TYPE};
use crate::config::AppConfig;
use crate::models::files::responses::FileUploadResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::grading::pdf::count_pages;
use crate::services::{Rejection, ServiceResult, blobs_from_request, current_user, respond};
use crate::utils::multipart::read_single_file;
use crate::utils::validate_magic_bytes;

pub async fn handle_upload(
    service: &FileService,
    request: &HttpRequest,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    respond(upload(service, request, payload).await)
}

async fn upload(
    service: &FileService,
    request: &HttpRequest,
    mut payload: Multipart,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    let blobs = blobs_from_request(request)?;

    let file = read_single_file(&mut payload, AppConfig::get().upload.max_size).await?;
    let extension = file.extension();
    if extension != ".pdf" {
        return Err(Rejection::bad_request(
            ErrorCode::FileTypeNotAllowed,
            "Only PDF files are allowed",
        ));
    }
    if !validate_magic_bytes(&file.data, &extension) {
        return Err(Rejection::bad_request(
            ErrorCode::FileTypeNotAllowed,
            "File content does not match its extension",
        ));
    }
    let page_count = count_pages(&file.data)?;

    let token = Uuid::new_v4().to_string();
    let stored_name = format!("{token}.pdf");
    blobs.put(&stored_name, &file.data).await?;

    let record = match storage
        .create_file(
            &token,
            &file.file_name,
            &stored_name,
            file.data.len() as i64,
            PDF_CONTENT_TYPE,
            user.id,
        )
        .await
    {
        Ok(record) => record,
        Err(e) => {
            if let Err(remove_err) = blobs.remove(&stored_name).await {
                warn!("Failed to remove orphan upload {}: {}", stored_name, remove_err);
            }
            return Err(e.into());
        }
    };

    info!(
        "User {} uploaded {} ({} bytes, {} pages)",
        user.id, record.download_token, record.file_size, page_count
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        FileUploadResponse {
            download_token: record.download_token,
            file_name: record.original_name,
            size: record.file_size,
            content_type: record.file_type,
            page_count,
            uploaded_at: record.created_at,
        },
        "File uploaded successfully",
    )))
}
