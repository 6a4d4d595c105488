use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::warn;

use super::AuthService;
use crate::models::auth::responses::{RefreshTokenResponse, UserInfoResponse};
use crate::models::users::entities::UserStatus;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{ServiceResult, current_user, respond};
use crate::utils::jwt::JwtUtils;

fn expired_session() -> HttpResponse {
    // 清除无效的 refresh token cookie
    HttpResponse::Unauthorized()
        .cookie(JwtUtils::create_empty_refresh_token_cookie())
        .json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Login expired or invalid, please login again",
        ))
}

pub async fn handle_refresh_token(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    respond(refresh(service, request).await)
}

async fn refresh(service: &AuthService, request: &HttpRequest) -> ServiceResult<HttpResponse> {
    let Some(refresh_token) = JwtUtils::extract_refresh_token_from_cookie(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        )));
    };

    let claims = match JwtUtils::verify_refresh_token(&refresh_token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("Refresh token rejected: {}", e);
            return Ok(expired_session());
        }
    };

    // 以数据库中的当前角色和状态为准
    let storage = service.get_storage(request)?;
    let user = match storage.get_user_by_id(claims.user_id()?).await? {
        Some(user) if user.status == UserStatus::Active => user,
        _ => return Ok(expired_session()),
    };

    let access_token = JwtUtils::generate_access_token(user.id, user.role().as_str())?;
    let response = RefreshTokenResponse {
        access_token,
        expires_in: service.get_config().jwt.access_token_expiry,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Token refreshed successfully",
    )))
}

pub async fn handle_get_user(request: &HttpRequest) -> ActixResult<HttpResponse> {
    respond(current_user(request).map(|user| {
        HttpResponse::Ok().json(ApiResponse::success(
            UserInfoResponse { user },
            "User information retrieved successfully",
        ))
    }))
}
