use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::dashboard::requests::OrganizationDashboardParams;
use crate::models::users::entities::UserRole;
use crate::services::DashboardService;

static DASHBOARD_SERVICE: Lazy<DashboardService> = Lazy::new(DashboardService::new_lazy);

pub async fn teacher_dashboard(req: HttpRequest) -> ActixResult<HttpResponse> {
    DASHBOARD_SERVICE.teacher_dashboard(&req).await
}

pub async fn organization_dashboard(
    req: HttpRequest,
    query: web::Query<OrganizationDashboardParams>,
) -> ActixResult<HttpResponse> {
    DASHBOARD_SERVICE
        .organization_dashboard(&req, query.into_inner())
        .await
}

pub async fn institutional_dashboard(req: HttpRequest) -> ActixResult<HttpResponse> {
    DASHBOARD_SERVICE.institutional_dashboard(&req).await
}

// 配置路由
pub fn configure_dashboard_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/dashboard")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/teacher")
                    .wrap(middlewares::RequireRole::new(&UserRole::Teacher))
                    .route(web::get().to(teacher_dashboard)),
            )
            .service(
                web::resource("/organization")
                    .wrap(middlewares::RequireRole::new_any(UserRole::manager_roles()))
                    .route(web::get().to(organization_dashboard)),
            )
            .service(
                web::resource("/institutional")
                    .wrap(middlewares::RequireRole::new_any(
                        UserRole::institutional_roles(),
                    ))
                    .route(web::get().to(institutional_dashboard)),
            ),
    );
}
