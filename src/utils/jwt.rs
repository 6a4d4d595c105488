use crate::config::AppConfig;
use crate::errors::{GraderError, Result};
use actix_web::cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN: &str = "access";
pub const REFRESH_TOKEN: &str = "refresh";
const REFRESH_COOKIE: &str = "refresh_token";

// JWT Claims 结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // 用户 ID
    pub role: String,       // 签发时的角色
    pub token_type: String, // "access" 或 "refresh"
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64> {
        self.sub
            .parse::<i64>()
            .map_err(|_| GraderError::authentication("Invalid token subject"))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct JwtUtils;

impl JwtUtils {
    fn secret() -> &'static str {
        &AppConfig::get().jwt.secret
    }

    /// access token 有效期（秒）
    pub fn access_token_ttl() -> i64 {
        AppConfig::get().jwt.access_token_expiry
    }

    pub fn generate_access_token(user_id: i64, role: &str) -> Result<String> {
        Self::encode_with(
            Self::secret(),
            user_id,
            role,
            ACCESS_TOKEN,
            chrono::Duration::seconds(Self::access_token_ttl()),
        )
    }

    pub fn generate_refresh_token(
        user_id: i64,
        role: &str,
        token_expiry: Option<chrono::Duration>,
    ) -> Result<String> {
        let expiry = token_expiry.unwrap_or_else(|| {
            chrono::Duration::seconds(AppConfig::get().jwt.refresh_token_expiry)
        });
        Self::encode_with(Self::secret(), user_id, role, REFRESH_TOKEN, expiry)
    }

    pub fn generate_token_pair(
        user_id: i64,
        role: &str,
        refresh_token_expiry: Option<chrono::Duration>,
    ) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: Self::generate_access_token(user_id, role)?,
            refresh_token: Self::generate_refresh_token(user_id, role, refresh_token_expiry)?,
        })
    }

    pub fn verify_access_token(token: &str) -> Result<Claims> {
        Self::decode_with(Self::secret(), token, ACCESS_TOKEN)
    }

    pub fn verify_refresh_token(token: &str) -> Result<Claims> {
        Self::decode_with(Self::secret(), token, REFRESH_TOKEN)
    }

    pub(crate) fn encode_with(
        secret: &str,
        user_id: i64,
        role: &str,
        token_type: &str,
        expiry: chrono::Duration,
    ) -> Result<String> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            token_type: token_type.to_string(),
            exp: (now + expiry).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| GraderError::authentication(format!("Failed to sign token: {e}")))
    }

    pub(crate) fn decode_with(secret: &str, token: &str, expected_type: &str) -> Result<Claims> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| GraderError::authentication(format!("Invalid token: {e}")))?;

        if claims.token_type != expected_type {
            return Err(GraderError::authentication("Unexpected token type"));
        }
        Ok(claims)
    }

    pub fn create_refresh_token_cookie(refresh_token: &str, max_age_seconds: i64) -> Cookie<'static> {
        Cookie::build(REFRESH_COOKIE, refresh_token.to_string())
            .path("/")
            .max_age(actix_web::cookie::time::Duration::seconds(max_age_seconds))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(AppConfig::get().is_production())
            .finish()
    }

    /// 用于注销
    pub fn create_empty_refresh_token_cookie() -> Cookie<'static> {
        Self::create_refresh_token_cookie("", 0)
    }

    pub fn extract_refresh_token_from_cookie(req: &actix_web::HttpRequest) -> Option<String> {
        req.cookie(REFRESH_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_access_token_round_trip() {
        let token = JwtUtils::encode_with(SECRET, 7, "teacher", ACCESS_TOKEN, chrono::Duration::minutes(5)).unwrap();
        let claims = JwtUtils::decode_with(SECRET, &token, ACCESS_TOKEN).unwrap();
        assert_eq!(claims.user_id().unwrap(), 7);
        assert_eq!(claims.role, "teacher");
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let token = JwtUtils::encode_with(SECRET, 7, "teacher", REFRESH_TOKEN, chrono::Duration::minutes(5)).unwrap();
        let err = JwtUtils::decode_with(SECRET, &token, ACCESS_TOKEN).unwrap_err();
        assert!(matches!(err, GraderError::Authentication(_)));
    }

    #[test]
    fn test_expired_and_foreign_tokens_are_rejected() {
        let expired = JwtUtils::encode_with(SECRET, 1, "admin", ACCESS_TOKEN, chrono::Duration::minutes(-10)).unwrap();
        assert!(JwtUtils::decode_with(SECRET, &expired, ACCESS_TOKEN).is_err());

        let foreign = JwtUtils::encode_with("other", 1, "admin", ACCESS_TOKEN, chrono::Duration::minutes(5)).unwrap();
        assert!(JwtUtils::decode_with(SECRET, &foreign, ACCESS_TOKEN).is_err());
    }
}
