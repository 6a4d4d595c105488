use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{OrganizationService, director_draft, new_organization};
use crate::models::audit_logs::entities::{NewAuditLog, actions};
use crate::models::organizations::requests::CreateOrganizationRequest;
use crate::models::organizations::responses::CreateOrganizationResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, ServiceResult, audit_logs, current_user, email, respond};

pub async fn create_organization(
    service: &OrganizationService,
    request: &HttpRequest,
    data: CreateOrganizationRequest,
) -> ActixResult<HttpResponse> {
    respond(create(service, request, data).await)
}

async fn create(
    service: &OrganizationService,
    request: &HttpRequest,
    data: CreateOrganizationRequest,
) -> ServiceResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let organization = new_organization(
        &data.name,
        &data.subdomain,
        data.education_level,
        data.subscription_plan,
        data.credits_per_period,
    )?;
    if storage
        .get_organization_by_subdomain(&organization.subdomain)
        .await?
        .is_some()
    {
        return Err(Rejection::conflict(
            ErrorCode::OrganizationSubdomainExists,
            "Subdomain already exists",
        ));
    }

    let (organization, director) = match (data.director_name, data.director_email) {
        (Some(name), Some(director_email)) => {
            let draft = director_draft(&name, &director_email).await??;
            if storage.get_user_by_email(&draft.user.email).await?.is_some() {
                return Err(Rejection::conflict(
                    ErrorCode::UserEmailAlreadyExists,
                    "Director email already exists",
                ));
            }
            let (organization, director) = storage
                .create_organization_with_director(organization, draft.user)
                .await?;
            email::send_welcome_email(&director.profile.full_name, &director.email, &draft.password)
                .await;
            (organization, Some(director))
        }
        (None, None) => (storage.create_organization(organization).await?, None),
        _ => {
            return Err(Rejection::bad_request(
                ErrorCode::BadRequest,
                "director_name and director_email must be given together",
            ));
        }
    };

    info!(
        "Organization {} ({}) created by {}",
        organization.id, organization.subdomain, actor.id
    );
    audit_logs::record(
        &storage,
        request,
        &actor,
        NewAuditLog::new(actions::ORGANIZATION_CREATE, "organization", Some(organization.id))
            .details(serde_json::json!({
                "subdomain": organization.subdomain,
                "director_id": director.as_ref().map(|d| d.id),
            })),
    )
    .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        CreateOrganizationResponse {
            organization,
            director,
        },
        "Organization created successfully",
    )))
}
