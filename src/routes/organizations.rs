use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::credits::requests::CreditTransactionListParams;
use crate::models::organizations::requests::{
    AdjustCreditsRequest, CreateOrganizationRequest, OrganizationListParams,
    UpdateOrganizationRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::OrganizationService;
use crate::utils::SafeIDI64;

static ORGANIZATION_SERVICE: Lazy<OrganizationService> =
    Lazy::new(OrganizationService::new_lazy);

pub async fn list_organizations(
    req: HttpRequest,
    query: web::Query<OrganizationListParams>,
) -> ActixResult<HttpResponse> {
    ORGANIZATION_SERVICE
        .list_organizations(&req, query.into_inner())
        .await
}

pub async fn create_organization(
    req: HttpRequest,
    data: web::Json<CreateOrganizationRequest>,
) -> ActixResult<HttpResponse> {
    ORGANIZATION_SERVICE
        .create_organization(&req, data.into_inner())
        .await
}

pub async fn get_organization(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    ORGANIZATION_SERVICE.get_organization(&req, id.0).await
}

pub async fn update_organization(
    req: HttpRequest,
    id: SafeIDI64,
    data: web::Json<UpdateOrganizationRequest>,
) -> ActixResult<HttpResponse> {
    ORGANIZATION_SERVICE
        .update_organization(&req, id.0, data.into_inner())
        .await
}

pub async fn delete_organization(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    ORGANIZATION_SERVICE.delete_organization(&req, id.0).await
}

pub async fn adjust_credits(
    req: HttpRequest,
    id: SafeIDI64,
    data: web::Json<AdjustCreditsRequest>,
) -> ActixResult<HttpResponse> {
    ORGANIZATION_SERVICE
        .adjust_credits(&req, id.0, data.into_inner())
        .await
}

pub async fn list_credit_transactions(
    req: HttpRequest,
    id: SafeIDI64,
    query: web::Query<CreditTransactionListParams>,
) -> ActixResult<HttpResponse> {
    ORGANIZATION_SERVICE
        .list_credit_transactions(&req, id.0, query.into_inner())
        .await
}

pub async fn import_organizations(
    req: HttpRequest,
    payload: actix_multipart::Multipart,
) -> ActixResult<HttpResponse> {
    ORGANIZATION_SERVICE.import_organizations(&req, payload).await
}

// 配置路由
pub fn configure_organization_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/organizations")
            .wrap(middlewares::RequireJWT)
            // 组织管理员也可以查看本组织的积分流水
            .service(
                web::resource("/{id}/credit-transactions")
                    .wrap(middlewares::RequireRole::new_any(UserRole::manager_roles()))
                    .route(web::get().to(list_credit_transactions)),
            )
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::superadmin_roles()))
                    .route("", web::get().to(list_organizations))
                    .route("", web::post().to(create_organization))
                    .service(
                        web::resource("/import")
                            .wrap(middlewares::RateLimit::import())
                            .route(web::post().to(import_organizations)),
                    )
                    .route("/{id}", web::get().to(get_organization))
                    .route("/{id}", web::put().to(update_organization))
                    .route("/{id}", web::delete().to(delete_organization))
                    .route("/{id}/credits", web::post().to(adjust_credits)),
            ),
    );
}
