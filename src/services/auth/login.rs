use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::AuthService;
use crate::models::auth::{requests::LoginRequest, responses::LoginResponse};
use crate::models::users::entities::UserStatus;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, ServiceResult, respond};
use crate::utils::jwt::JwtUtils;
use crate::utils::password::verify_password;

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    respond(login(service, login_request, request).await)
}

fn invalid_credentials() -> Rejection {
    Rejection::new(
        actix_web::http::StatusCode::UNAUTHORIZED,
        ErrorCode::AuthFailed,
        "Email or password is incorrect",
    )
}

async fn login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ServiceResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let config = service.get_config();

    let email = login_request.email.trim().to_lowercase();
    let user = storage
        .get_user_by_email(&email)
        .await?
        .ok_or_else(invalid_credentials)?;

    // argon2 校验放到阻塞线程
    let password = login_request.password;
    let hash = user.password_hash.clone();
    let verified = actix_web::web::block(move || verify_password(&password, &hash))
        .await
        .unwrap_or(false);
    if !verified {
        warn!("Failed login attempt for {}", email);
        return Err(invalid_credentials());
    }

    if user.status != UserStatus::Active {
        return Err(Rejection::forbidden(
            ErrorCode::AuthFailed,
            "Account is not active",
        ));
    }

    if let Err(e) = storage.update_last_login(user.id).await {
        warn!("Failed to update last login for user {}: {}", user.id, e);
    }

    let refresh_ttl = if login_request.remember_me {
        config.jwt.refresh_token_remember_me_expiry
    } else {
        config.jwt.refresh_token_expiry
    };
    let token_pair = user.generate_token_pair(Some(chrono::Duration::seconds(refresh_ttl)))?;

    info!("User {} logged in", user.id);

    let response = LoginResponse {
        access_token: token_pair.access_token,
        expires_in: config.jwt.access_token_expiry,
        user,
        created_at: chrono::Utc::now(),
    };
    let refresh_cookie = JwtUtils::create_refresh_token_cookie(&token_pair.refresh_token, refresh_ttl);

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie)
        .json(ApiResponse::success(response, "Login successful")))
}
