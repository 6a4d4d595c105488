use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::OrganizationService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, ServiceResult, respond};

pub async fn get_organization(
    service: &OrganizationService,
    request: &HttpRequest,
    organization_id: i64,
) -> ActixResult<HttpResponse> {
    respond(get(service, request, organization_id).await)
}

async fn get(
    service: &OrganizationService,
    request: &HttpRequest,
    organization_id: i64,
) -> ServiceResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let organization = storage
        .get_organization_by_id(organization_id)
        .await?
        .ok_or_else(|| {
            Rejection::not_found(ErrorCode::OrganizationNotFound, "Organization not found")
        })?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        organization,
        "Organization retrieved successfully",
    )))
}
