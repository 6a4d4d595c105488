use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use tracing::info;

use super::{UserService, can_assign_role};
use crate::config::AppConfig;
use crate::errors::GraderError;
use crate::models::audit_logs::entities::{NewAuditLog, actions};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{CreateUserRequest, NewUser};
use crate::models::users::responses::CreateUserResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, ServiceResult, audit_logs, current_user, email, respond};
use crate::utils::password::hash_password;
use crate::utils::random_code::generate_password;
use crate::utils::validate::{validate_email, validate_full_name, validate_password_simple};

pub async fn create_user(
    service: &UserService,
    user_data: CreateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    respond(create(service, user_data, request).await)
}

async fn create(
    service: &UserService,
    user_data: CreateUserRequest,
    request: &HttpRequest,
) -> ServiceResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;
    let config = AppConfig::get();

    if !can_assign_role(&actor, &user_data.role) {
        return Err(Rejection::forbidden(
            ErrorCode::Forbidden,
            format!("You cannot create users with role {}", user_data.role),
        ));
    }

    let email_address = user_data.email.trim().to_lowercase();
    validate_email(&email_address)
        .map_err(|msg| Rejection::bad_request(ErrorCode::UserEmailInvalid, msg))?;
    let full_name = user_data.full_name.trim().to_string();
    validate_full_name(&full_name)
        .map_err(|msg| Rejection::bad_request(ErrorCode::UserNameInvalid, msg))?;

    let monthly_credit_limit = user_data
        .monthly_credit_limit
        .unwrap_or(config.credits.default_monthly_limit);
    if monthly_credit_limit < 0 {
        return Err(Rejection::bad_request(
            ErrorCode::BadRequest,
            "monthly_credit_limit must not be negative",
        ));
    }

    // 组织归属：平台角色不属于任何组织；管理员始终使用自己的组织
    let organization_id = match user_data.role {
        UserRole::Superadmin | UserRole::InstitutionalManager => None,
        _ if actor.is_superadmin() => {
            let org_id = user_data.organization_id.ok_or_else(|| {
                Rejection::bad_request(ErrorCode::BadRequest, "organization_id is required")
            })?;
            storage.get_organization_by_id(org_id).await?.ok_or_else(|| {
                Rejection::not_found(ErrorCode::OrganizationNotFound, "Organization not found")
            })?;
            Some(org_id)
        }
        _ => actor.organization_id(),
    };

    if storage.get_user_by_email(&email_address).await?.is_some() {
        return Err(Rejection::conflict(
            ErrorCode::UserEmailAlreadyExists,
            "Email already exists",
        ));
    }

    let password = match user_data.password {
        Some(password) => {
            validate_password_simple(&password)
                .map_err(|msg| Rejection::bad_request(ErrorCode::UserPasswordInvalid, msg))?;
            password
        }
        None => generate_password(12),
    };

    let to_hash = password.clone();
    let password_hash = web::block(move || hash_password(&to_hash))
        .await
        .map_err(|e| GraderError::serialization(format!("Password hashing task failed: {e}")))??;

    let user = storage
        .create_user(NewUser {
            email: email_address,
            password_hash,
            full_name,
            role: user_data.role,
            organization_id,
            monthly_credit_limit,
        })
        .await?;

    info!("User {} created by {}", user.id, actor.id);
    audit_logs::record(
        &storage,
        request,
        &actor,
        NewAuditLog::new(actions::USER_CREATE, "user", Some(user.id)).details(
            serde_json::json!({ "role": user.role().as_str(), "organization_id": organization_id }),
        ),
    )
    .await;

    let welcome_email_sent =
        email::send_welcome_email(&user.profile.full_name, &user.email, &password).await;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        CreateUserResponse {
            user,
            welcome_email_sent,
        },
        "User created successfully",
    )))
}
