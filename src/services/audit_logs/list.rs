use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AuditLogService;
use crate::models::audit_logs::requests::{AuditLogListParams, AuditLogListQuery};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, ServiceResult, current_user, respond};

pub async fn list_audit_logs(
    service: &AuditLogService,
    request: &HttpRequest,
    query: AuditLogListParams,
) -> ActixResult<HttpResponse> {
    respond(list(service, request, query).await)
}

async fn list(
    service: &AuditLogService,
    request: &HttpRequest,
    query: AuditLogListParams,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    // 组织管理员只能查看本组织
    let organization_id = match (user.is_superadmin(), user.role().is_org_manager()) {
        (true, _) => query.organization_id,
        (false, true) if user.organization_id().is_some() => user.organization_id(),
        _ => {
            return Err(Rejection::forbidden(
                ErrorCode::Forbidden,
                "You do not have permission to view audit logs",
            ));
        }
    };

    let response = storage
        .list_audit_logs_with_pagination(AuditLogListQuery {
            page: Some(query.pagination.page),
            size: Some(query.pagination.size),
            organization_id,
            action: query.action.filter(|a| !a.trim().is_empty()),
        })
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Audit logs retrieved successfully",
    )))
}
