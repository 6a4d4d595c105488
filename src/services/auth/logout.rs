use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::middlewares::RequireJWT;
use crate::middlewares::require_jwt::user_cache_key;
use crate::models::ApiResponse;
use crate::services::cache_from_request;
use crate::utils::jwt::JwtUtils;

/// 清除 refresh token cookie 与缓存的登录身份
pub async fn handle_logout(request: &HttpRequest) -> ActixResult<HttpResponse> {
    if let (Some(cache), Some(token)) = (
        cache_from_request(request),
        RequireJWT::extract_token(request),
    ) {
        cache.remove(&user_cache_key(&token)).await;
    }

    Ok(HttpResponse::Ok()
        .cookie(JwtUtils::create_empty_refresh_token_cookie())
        .json(ApiResponse::<()>::success_empty("Logged out")))
}
