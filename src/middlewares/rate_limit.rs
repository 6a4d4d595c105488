/*!
 * 速率限制中间件
 *
 * 固定窗口计数：键为 `前缀:用户或IP:窗口序号`，计数存放在进程内 moka 缓存中。
 * 已认证请求按用户 ID 计数，否则按客户端 IP。超过限制返回 429。
 *
 * ```rust,ignore
 * web::resource("/login")
 *     .wrap(RateLimit::login())
 *     .route(web::post().to(login))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::CONTENT_TYPE,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

use crate::models::{ApiResponse, ErrorCode, users::entities::User};

/// 最长窗口
const MAX_WINDOW_SECS: u64 = 3600;

static RATE_LIMIT_CACHE: Lazy<Cache<String, u32>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(MAX_WINDOW_SECS))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window_secs: u64,
    key_prefix: &'static str,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_secs: u64, key_prefix: &'static str) -> Self {
        Self {
            max_requests,
            window_secs: window_secs.clamp(1, MAX_WINDOW_SECS),
            key_prefix,
        }
    }

    /// 登录：5 次/分钟/IP
    pub fn login() -> Self {
        Self::new(5, 60, "login")
    }

    /// 刷新令牌：10 次/分钟/IP
    pub fn refresh_token() -> Self {
        Self::new(10, 60, "refresh")
    }

    /// AI 评分：10 次/分钟/用户
    pub fn grading() -> Self {
        Self::new(10, 60, "grading")
    }

    /// CSV 导入：5 次/分钟/用户
    pub fn import() -> Self {
        Self::new(5, 60, "import")
    }

    /// 文件上传：30 次/分钟/用户
    pub fn file_upload() -> Self {
        Self::new(30, 60, "upload")
    }

    fn window_key(&self, identifier: &str, now: u64) -> String {
        format!("{}:{}:{}", self.key_prefix, identifier, now / self.window_secs)
    }

    fn retry_after(&self, now: u64) -> u64 {
        self.window_secs - now % self.window_secs
    }
}

/// 客户端 IP：优先使用连接信息，其次是代理头
fn extract_client_ip(req: &ServiceRequest) -> String {
    let connection_ip = req
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string());

    if let Some(ref ip) = connection_ip
        && ip.parse::<IpAddr>().is_ok()
    {
        return ip.clone();
    }

    for header in ["X-Forwarded-For", "X-Real-IP"] {
        if let Some(value) = req.headers().get(header)
            && let Ok(value) = value.to_str()
            && let Some(ip) = value.split(',').next().map(str::trim)
            && ip.parse::<IpAddr>().is_ok()
        {
            return ip.to_string();
        }
    }

    connection_ip.unwrap_or_else(|| "unknown".to_string())
}

fn extract_user_id(req: &ServiceRequest) -> Option<i64> {
    req.extensions().get::<User>().map(|user| user.id)
}

fn create_rate_limit_response(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .insert_header(("X-RateLimit-Remaining", "0"))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please try again later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let limit = self.limit.clone();

        Box::pin(async move {
            let identifier = match extract_user_id(&req) {
                Some(user_id) => format!("user:{user_id}"),
                None => format!("ip:{}", extract_client_ip(&req)),
            };

            let now = chrono::Utc::now().timestamp().max(0) as u64;
            let cache_key = limit.window_key(&identifier, now);

            let entry = RATE_LIMIT_CACHE
                .entry(cache_key.clone())
                .and_upsert_with(|existing| {
                    let count = existing.map(|e| e.into_value()).unwrap_or(0);
                    std::future::ready(count.saturating_add(1))
                })
                .await;
            let count = entry.into_value();

            if count > limit.max_requests {
                warn!(
                    "Rate limit exceeded for key: {} (count: {}/{})",
                    cache_key, count, limit.max_requests
                );
                return Ok(req.into_response(
                    create_rate_limit_response(limit.retry_after(now)).map_into_right_body(),
                ));
            }

            Ok(srv.call(req).await?.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test as atest, web};

    #[test]
    fn test_window_keys_and_retry_after() {
        let limit = RateLimit::new(5, 60, "login");
        assert_eq!(limit.window_key("ip:1.2.3.4", 125), "login:ip:1.2.3.4:2");
        assert_eq!(limit.retry_after(125), 55);
        assert_eq!(RateLimit::new(1, 0, "x").window_secs, 1);
    }

    #[actix_web::test]
    async fn test_requests_over_limit_get_429() {
        let app = atest::init_service(
            App::new().service(
                web::resource("/ping")
                    .wrap(RateLimit::new(2, 3600, "test-ping"))
                    .route(web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;

        let ping = || atest::TestRequest::get().uri("/ping").to_request();
        for _ in 0..2 {
            let res = atest::call_service(&app, ping()).await;
            assert_eq!(res.status(), StatusCode::OK);
        }
        let res = atest::call_service(&app, ping()).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(res.headers().contains_key("Retry-After"));
    }

    #[actix_web::test]
    async fn test_authenticated_requests_are_keyed_by_user() {
        let fixture = crate::test_support::Fixture::new(10, 5).await;
        let teacher = fixture.teacher.clone();
        let app = atest::init_service(
            App::new().service(
                web::resource("/me")
                    .wrap(RateLimit::new(1, 3600, "test-me"))
                    .wrap_fn(move |req, srv| {
                        if req.headers().contains_key("x-signed-in") {
                            req.extensions_mut().insert(teacher.clone());
                        }
                        srv.call(req)
                    })
                    .route(web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;
        let request = |signed_in: bool| {
            let req = atest::TestRequest::get()
                .uri("/me")
                .peer_addr("10.30.0.7:5000".parse().unwrap());
            if signed_in {
                req.insert_header(("x-signed-in", "1")).to_request()
            } else {
                req.to_request()
            }
        };

        let res = atest::call_service(&app, request(true)).await;
        assert_eq!(res.status(), StatusCode::OK);
        let res = atest::call_service(&app, request(true)).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

        // 同一 IP 的匿名请求使用独立计数
        let res = atest::call_service(&app, request(false)).await;
        assert_eq!(res.status(), StatusCode::OK);
        let res = atest::call_service(&app, request(false)).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
