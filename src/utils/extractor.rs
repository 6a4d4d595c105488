//! 路径参数安全提取器
//!
//! 路径中的 ID 必须是正整数，否则直接返回 400 统一响应，不进入业务层。

use actix_web::{HttpResponse, error::InternalError};

use crate::models::{ApiResponse, ErrorCode};

pub(crate) fn bad_path_param(name: &str) -> actix_web::Error {
    let message = format!("Invalid path parameter: {name}");
    InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message)),
    )
    .into()
}

/// 定义一个从路径参数提取正整数 ID 的类型
#[macro_export]
macro_rules! define_safe_i64_extractor {
    ($name:ident, $param:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub i64);

        impl actix_web::FromRequest for $name {
            type Error = actix_web::Error;
            type Future = std::future::Ready<Result<Self, Self::Error>>;

            fn from_request(
                req: &actix_web::HttpRequest,
                _payload: &mut actix_web::dev::Payload,
            ) -> Self::Future {
                let parsed = req
                    .match_info()
                    .get($param)
                    .and_then(|raw| raw.parse::<i64>().ok())
                    .filter(|id| *id > 0);

                std::future::ready(match parsed {
                    Some(id) => Ok($name(id)),
                    None => Err($crate::utils::extractor::bad_path_param($param)),
                })
            }
        }
    };
}

define_safe_i64_extractor!(SafeIDI64, "id");
define_safe_i64_extractor!(SafeClassIdI64, "class_id");
define_safe_i64_extractor!(SafeExamIdI64, "exam_id");
define_safe_i64_extractor!(SafeStudentIdI64, "student_id");
define_safe_i64_extractor!(SafeSubmissionIdI64, "submission_id");
define_safe_i64_extractor!(SafeOrganizationIdI64, "organization_id");

/// 文件下载令牌（UUID）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeFileToken(pub String);

impl actix_web::FromRequest for SafeFileToken {
    type Error = actix_web::Error;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let token = req
            .match_info()
            .get("token")
            .filter(|raw| uuid::Uuid::parse_str(raw).is_ok())
            .map(|raw| raw.to_string());

        std::future::ready(token.map(SafeFileToken).ok_or_else(|| bad_path_param("token")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{FromRequest, test::TestRequest};

    #[actix_web::test]
    async fn test_positive_id_is_extracted() {
        let req = TestRequest::default().param("class_id", "42").to_http_request();
        let id = SafeClassIdI64::extract(&req).await.unwrap();
        assert_eq!(id.0, 42);
    }

    #[actix_web::test]
    async fn test_invalid_ids_are_rejected() {
        for raw in ["0", "-3", "abc", "9999999999999999999999"] {
            let req = TestRequest::default().param("id", raw).to_http_request();
            assert!(SafeIDI64::extract(&req).await.is_err(), "{raw} should be rejected");
        }
    }

    #[actix_web::test]
    async fn test_file_token_must_be_uuid() {
        let token = uuid::Uuid::new_v4().to_string();
        let req = TestRequest::default().param("token", token.clone()).to_http_request();
        assert_eq!(SafeFileToken::extract(&req).await.unwrap().0, token);

        let req = TestRequest::default().param("token", "../etc/passwd").to_http_request();
        assert!(SafeFileToken::extract(&req).await.is_err());
    }
}
