use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{UserService, can_assign_role, load_managed_user};
use crate::errors::GraderError;
use crate::models::audit_logs::entities::{NewAuditLog, actions};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, ServiceResult, audit_logs, current_user, respond};

pub async fn delete_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    respond(delete(service, user_id, request).await)
}

async fn delete(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ServiceResult<HttpResponse> {
    let actor = current_user(request)?;
    if user_id == actor.id {
        return Err(Rejection::bad_request(
            ErrorCode::CanNotDeleteCurrentUser,
            "Cannot delete current user",
        ));
    }

    let storage = service.get_storage(request)?;
    let target = load_managed_user(&storage, &actor, user_id).await?;
    if !can_assign_role(&actor, target.role()) {
        return Err(Rejection::forbidden(
            ErrorCode::Forbidden,
            "You cannot delete this user",
        ));
    }

    let deleted = storage.delete_user(user_id).await.map_err(|e| match e {
        GraderError::Conflict(_) => Rejection::conflict(
            ErrorCode::UserOwnsClasses,
            "User still teaches classes; delete them first",
        ),
        other => other.into(),
    })?;
    if !deleted {
        return Err(Rejection::not_found(ErrorCode::UserNotFound, "User not found"));
    }

    info!("User {} deleted by {}", user_id, actor.id);
    audit_logs::record(
        &storage,
        request,
        &actor,
        NewAuditLog::new(actions::USER_DELETE, "user", Some(user_id))
            .details(serde_json::json!({ "email": target.email })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("User deleted successfully")))
}
