use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header};

use super::FileService;
use crate::errors::GraderError;
use crate::models::ErrorCode;
use crate::services::{Rejection, ServiceResult, blobs_from_request, current_user, respond};

pub async fn handle_download(
    service: &FileService,
    request: &HttpRequest,
    file_token: String,
) -> ActixResult<HttpResponse> {
    respond(download(service, request, file_token).await)
}

async fn download(
    service: &FileService,
    request: &HttpRequest,
    file_token: String,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    let not_found = || Rejection::not_found(ErrorCode::FileNotFound, "File not found");

    let db_file = storage
        .get_file_by_token(&file_token)
        .await?
        .ok_or_else(not_found)?;

    // 上传者本人、超级管理员或同组织成员可下载
    if db_file.user_id != user.id && !user.is_superadmin() {
        let uploader_org = storage
            .get_user_by_id(db_file.user_id)
            .await?
            .and_then(|uploader| uploader.organization_id());
        if uploader_org.is_none() || uploader_org != user.organization_id() {
            return Err(not_found());
        }
    }

    let data = blobs_from_request(request)?
        .get(&db_file.stored_name)
        .await
        .map_err(|e| match e {
            GraderError::FileNotFound(_) => not_found(),
            other => other.into(),
        })?;

    // 使用数据库中的原始文件名
    let file_name = db_file.original_name.replace('"', "");
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, db_file.file_type))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ))
        .body(data))
}
