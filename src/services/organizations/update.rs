use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::OrganizationService;
use crate::models::audit_logs::entities::{NewAuditLog, actions};
use crate::models::organizations::requests::{OrganizationUpdate, UpdateOrganizationRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, ServiceResult, audit_logs, current_user, respond};

pub async fn update_organization(
    service: &OrganizationService,
    request: &HttpRequest,
    organization_id: i64,
    data: UpdateOrganizationRequest,
) -> ActixResult<HttpResponse> {
    respond(update(service, request, organization_id, data).await)
}

async fn update(
    service: &OrganizationService,
    request: &HttpRequest,
    organization_id: i64,
    data: UpdateOrganizationRequest,
) -> ServiceResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let name = data.name.map(|name| name.trim().to_string());
    if name.as_deref().is_some_and(str::is_empty) {
        return Err(Rejection::bad_request(
            ErrorCode::BadRequest,
            "Name must not be empty",
        ));
    }
    if data.credits_per_period.is_some_and(|credits| credits < 0) {
        return Err(Rejection::bad_request(
            ErrorCode::BadRequest,
            "credits_per_period must not be negative",
        ));
    }

    let organization = storage
        .update_organization(
            organization_id,
            OrganizationUpdate {
                name,
                education_level: data.education_level,
                subscription_plan: data.subscription_plan,
                credits_per_period: data.credits_per_period,
                renewal_date: data.renewal_date,
            },
        )
        .await?
        .ok_or_else(|| {
            Rejection::not_found(ErrorCode::OrganizationNotFound, "Organization not found")
        })?;

    audit_logs::record(
        &storage,
        request,
        &actor,
        NewAuditLog::new(actions::ORGANIZATION_UPDATE, "organization", Some(organization.id)),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        organization,
        "Organization updated successfully",
    )))
}
