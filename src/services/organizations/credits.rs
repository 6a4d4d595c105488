//! 组织积分：手动调整与流水查询

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::OrganizationService;
use crate::models::audit_logs::entities::{NewAuditLog, actions};
use crate::models::credits::requests::{CreditTransactionListParams, CreditTransactionListQuery};
use crate::models::credits::responses::AdjustCreditsResponse;
use crate::models::organizations::requests::AdjustCreditsRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::ensure_organization_access;
use crate::services::{Rejection, ServiceResult, audit_logs, current_user, respond};

pub async fn adjust_credits(
    service: &OrganizationService,
    request: &HttpRequest,
    organization_id: i64,
    data: AdjustCreditsRequest,
) -> ActixResult<HttpResponse> {
    respond(adjust(service, request, organization_id, data).await)
}

async fn adjust(
    service: &OrganizationService,
    request: &HttpRequest,
    organization_id: i64,
    data: AdjustCreditsRequest,
) -> ServiceResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    if data.amount == 0 {
        return Err(Rejection::bad_request(
            ErrorCode::BadRequest,
            "amount must not be zero",
        ));
    }
    storage
        .get_organization_by_id(organization_id)
        .await?
        .ok_or_else(|| {
            Rejection::not_found(ErrorCode::OrganizationNotFound, "Organization not found")
        })?;

    let description = data
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    let transaction = storage
        .adjust_organization_credits(organization_id, actor.id, data.amount, description)
        .await?;

    info!(
        "Organization {} credits adjusted by {} ({:+}), balance {}",
        organization_id, actor.id, data.amount, transaction.balance_after
    );
    audit_logs::record(
        &storage,
        request,
        &actor,
        NewAuditLog::new(actions::CREDITS_ADJUST, "organization", Some(organization_id)).details(
            serde_json::json!({
                "amount": data.amount,
                "balance_after": transaction.balance_after,
            }),
        ),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        AdjustCreditsResponse {
            credits_remaining: transaction.balance_after,
            transaction,
        },
        "Credits adjusted successfully",
    )))
}

pub async fn list_credit_transactions(
    service: &OrganizationService,
    request: &HttpRequest,
    organization_id: i64,
    query: CreditTransactionListParams,
) -> ActixResult<HttpResponse> {
    respond(list(service, request, organization_id, query).await)
}

async fn list(
    service: &OrganizationService,
    request: &HttpRequest,
    organization_id: i64,
    query: CreditTransactionListParams,
) -> ServiceResult<HttpResponse> {
    let actor = current_user(request)?;
    ensure_organization_access(&actor, organization_id)?;
    let storage = service.get_storage(request)?;

    let response = storage
        .list_credit_transactions(CreditTransactionListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            organization_id,
            kind: query.kind,
        })
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Credit transactions retrieved successfully",
    )))
}
