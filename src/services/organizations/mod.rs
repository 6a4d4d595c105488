pub mod create;
pub mod credits;
pub mod delete;
pub mod get;
pub mod import;
pub mod list;
pub mod update;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use super::{Rejection, ServiceResult, storage_from_request};
use crate::config::AppConfig;
use crate::errors::GraderError;
use crate::models::ErrorCode;
use crate::models::credits::requests::CreditTransactionListParams;
use crate::models::organizations::entities::SubscriptionPlan;
use crate::models::organizations::requests::{
    AdjustCreditsRequest, CreateOrganizationRequest, NewOrganization, OrganizationListParams,
    UpdateOrganizationRequest,
};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::NewUser;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::random_code::generate_password;
use crate::utils::validate::{validate_email, validate_full_name, validate_subdomain};

pub struct OrganizationService {
    storage: Option<Arc<dyn Storage>>,
}

impl OrganizationService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    pub async fn list_organizations(
        &self,
        request: &HttpRequest,
        query: OrganizationListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_organizations(self, request, query).await
    }

    pub async fn create_organization(
        &self,
        request: &HttpRequest,
        data: CreateOrganizationRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_organization(self, request, data).await
    }

    pub async fn get_organization(
        &self,
        request: &HttpRequest,
        organization_id: i64,
    ) -> ActixResult<HttpResponse> {
        get::get_organization(self, request, organization_id).await
    }

    pub async fn update_organization(
        &self,
        request: &HttpRequest,
        organization_id: i64,
        data: UpdateOrganizationRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_organization(self, request, organization_id, data).await
    }

    pub async fn delete_organization(
        &self,
        request: &HttpRequest,
        organization_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::delete_organization(self, request, organization_id).await
    }

    // 手动调整积分
    pub async fn adjust_credits(
        &self,
        request: &HttpRequest,
        organization_id: i64,
        data: AdjustCreditsRequest,
    ) -> ActixResult<HttpResponse> {
        credits::adjust_credits(self, request, organization_id, data).await
    }

    // 积分流水
    pub async fn list_credit_transactions(
        &self,
        request: &HttpRequest,
        organization_id: i64,
        query: CreditTransactionListParams,
    ) -> ActixResult<HttpResponse> {
        credits::list_credit_transactions(self, request, organization_id, query).await
    }

    // CSV 批量创建组织
    pub async fn import_organizations(
        &self,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        import::import_organizations(self, request, payload).await
    }
}

/// 字段校验失败
#[derive(Debug)]
pub(crate) struct InvalidField {
    pub field: &'static str,
    pub code: ErrorCode,
    pub message: &'static str,
}

impl From<InvalidField> for Rejection {
    fn from(err: InvalidField) -> Self {
        Rejection::bad_request(err.code, format!("{}: {}", err.field, err.message))
    }
}

/// 校验组织字段并构造新组织，积分按周期额度初始化
pub(crate) fn new_organization(
    name: &str,
    subdomain: &str,
    education_level: Option<String>,
    subscription_plan: Option<SubscriptionPlan>,
    credits_per_period: Option<i64>,
) -> Result<NewOrganization, InvalidField> {
    let name = name.trim();
    if name.is_empty() {
        return Err(InvalidField {
            field: "name",
            code: ErrorCode::BadRequest,
            message: "Name must not be empty",
        });
    }
    let subdomain = subdomain.trim().to_lowercase();
    validate_subdomain(&subdomain).map_err(|message| InvalidField {
        field: "subdomain",
        code: ErrorCode::OrganizationSubdomainInvalid,
        message,
    })?;

    let config = AppConfig::get();
    let credits_per_period = credits_per_period.unwrap_or(config.credits.default_per_period);
    if credits_per_period < 0 {
        return Err(InvalidField {
            field: "credits_per_period",
            code: ErrorCode::BadRequest,
            message: "credits_per_period must not be negative",
        });
    }

    Ok(NewOrganization {
        name: name.to_string(),
        subdomain,
        education_level: education_level
            .map(|level| level.trim().to_string())
            .filter(|level| !level.is_empty()),
        subscription_plan: subscription_plan.unwrap_or(SubscriptionPlan::Free),
        credits_remaining: credits_per_period,
        credits_per_period,
        renewal_date: chrono::Utc::now().timestamp() + config.credits.period_days * 86_400,
    })
}

/// 校长账号草稿（含明文临时密码，用于欢迎邮件）
pub(crate) struct DirectorDraft {
    pub user: NewUser,
    pub password: String,
}

/// 校验校长信息并生成临时密码，organization_id 由存储层在事务中填写
pub(crate) async fn director_draft(
    full_name: &str,
    email: &str,
) -> ServiceResult<Result<DirectorDraft, InvalidField>> {
    let full_name = full_name.trim().to_string();
    if let Err(message) = validate_full_name(&full_name) {
        return Ok(Err(InvalidField {
            field: "director_name",
            code: ErrorCode::UserNameInvalid,
            message,
        }));
    }
    let email = email.trim().to_lowercase();
    if let Err(message) = validate_email(&email) {
        return Ok(Err(InvalidField {
            field: "director_email",
            code: ErrorCode::UserEmailInvalid,
            message,
        }));
    }

    let password = generate_password(12);
    let to_hash = password.clone();
    let password_hash = web::block(move || hash_password(&to_hash))
        .await
        .map_err(|e| GraderError::serialization(format!("Password hashing task failed: {e}")))??;

    Ok(Ok(DirectorDraft {
        user: NewUser {
            email,
            password_hash,
            full_name,
            role: UserRole::Director,
            organization_id: None,
            monthly_credit_limit: AppConfig::get().credits.default_monthly_limit,
        },
        password,
    }))
}
