use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use tracing::info;

use super::{UserService, can_assign_role, load_managed_user};
use crate::errors::GraderError;
use crate::models::audit_logs::entities::{NewAuditLog, actions};
use crate::models::users::requests::{UpdateUserRequest, UserUpdate};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, ServiceResult, audit_logs, current_user, respond};
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_full_name, validate_password_simple};

pub async fn update_user(
    service: &UserService,
    user_id: i64,
    update_data: UpdateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    respond(update(service, user_id, update_data, request).await)
}

async fn update(
    service: &UserService,
    user_id: i64,
    update_data: UpdateUserRequest,
    request: &HttpRequest,
) -> ServiceResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;
    let target = load_managed_user(&storage, &actor, user_id).await?;

    if !can_assign_role(&actor, target.role()) {
        return Err(Rejection::forbidden(
            ErrorCode::Forbidden,
            "You cannot modify this user",
        ));
    }
    if let Some(role) = &update_data.role {
        if !can_assign_role(&actor, role) {
            return Err(Rejection::forbidden(
                ErrorCode::Forbidden,
                format!("You cannot assign role {role}"),
            ));
        }
        if target.id == actor.id && role != actor.role() {
            return Err(Rejection::bad_request(
                ErrorCode::UserUpdateFailed,
                "You cannot change your own role",
            ));
        }
    }
    if target.id == actor.id && update_data.status.is_some() {
        return Err(Rejection::bad_request(
            ErrorCode::UserUpdateFailed,
            "You cannot change your own status",
        ));
    }

    let full_name = match update_data.full_name {
        Some(name) => {
            let name = name.trim().to_string();
            validate_full_name(&name)
                .map_err(|msg| Rejection::bad_request(ErrorCode::UserNameInvalid, msg))?;
            Some(name)
        }
        None => None,
    };
    if update_data.monthly_credit_limit.is_some_and(|limit| limit < 0) {
        return Err(Rejection::bad_request(
            ErrorCode::BadRequest,
            "monthly_credit_limit must not be negative",
        ));
    }
    let password_hash = match update_data.password {
        Some(password) => {
            validate_password_simple(&password)
                .map_err(|msg| Rejection::bad_request(ErrorCode::UserPasswordInvalid, msg))?;
            let hash = web::block(move || hash_password(&password))
                .await
                .map_err(|e| {
                    GraderError::serialization(format!("Password hashing task failed: {e}"))
                })??;
            Some(hash)
        }
        None => None,
    };

    let changed_fields: Vec<&str> = [
        ("full_name", full_name.is_some()),
        ("role", update_data.role.is_some()),
        ("status", update_data.status.is_some()),
        ("monthly_credit_limit", update_data.monthly_credit_limit.is_some()),
        ("password", password_hash.is_some()),
    ]
    .into_iter()
    .filter_map(|(field, changed)| changed.then_some(field))
    .collect();

    let user = storage
        .update_user(
            user_id,
            UserUpdate {
                password_hash,
                full_name,
                role: update_data.role,
                status: update_data.status,
                monthly_credit_limit: update_data.monthly_credit_limit,
            },
        )
        .await?
        .ok_or_else(|| Rejection::not_found(ErrorCode::UserNotFound, "User not found"))?;

    info!("User {} updated by {}", user.id, actor.id);
    audit_logs::record(
        &storage,
        request,
        &actor,
        NewAuditLog::new(actions::USER_UPDATE, "user", Some(user.id))
            .details(serde_json::json!({ "fields": changed_fields })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(user, "User updated successfully")))
}
