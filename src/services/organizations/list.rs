use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::OrganizationService;
use crate::models::ApiResponse;
use crate::models::organizations::requests::{OrganizationListParams, OrganizationListQuery};
use crate::services::{ServiceResult, respond};

pub async fn list_organizations(
    service: &OrganizationService,
    request: &HttpRequest,
    query: OrganizationListParams,
) -> ActixResult<HttpResponse> {
    respond(list(service, request, query).await)
}

async fn list(
    service: &OrganizationService,
    request: &HttpRequest,
    query: OrganizationListParams,
) -> ServiceResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let response = storage
        .list_organizations_with_pagination(OrganizationListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            search: query.search,
        })
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Organization list retrieved successfully",
    )))
}
