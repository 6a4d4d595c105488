use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::warn;

use super::OrganizationService;
use crate::models::audit_logs::entities::{NewAuditLog, actions};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, ServiceResult, audit_logs, current_user, respond};

pub async fn delete_organization(
    service: &OrganizationService,
    request: &HttpRequest,
    organization_id: i64,
) -> ActixResult<HttpResponse> {
    respond(delete(service, request, organization_id).await)
}

async fn delete(
    service: &OrganizationService,
    request: &HttpRequest,
    organization_id: i64,
) -> ServiceResult<HttpResponse> {
    let actor = current_user(request)?;
    if actor.organization_id() == Some(organization_id) {
        return Err(Rejection::bad_request(
            ErrorCode::BadRequest,
            "Cannot delete your own organization",
        ));
    }

    let storage = service.get_storage(request)?;
    if !storage.delete_organization(organization_id).await? {
        return Err(Rejection::not_found(
            ErrorCode::OrganizationNotFound,
            "Organization not found",
        ));
    }

    warn!("Organization {} deleted by {}", organization_id, actor.id);
    audit_logs::record(
        &storage,
        request,
        &actor,
        NewAuditLog::new(actions::ORGANIZATION_DELETE, "organization", Some(organization_id)),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Organization deleted successfully")))
}
