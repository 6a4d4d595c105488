use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::grading::requests::GradeSubmissionRequest;
use crate::models::users::entities::UserRole;
use crate::services::GradingService;
use crate::utils::SafeIDI64;

static GRADING_SERVICE: Lazy<GradingService> = Lazy::new(GradingService::new_lazy);

pub async fn grade_submission(
    req: HttpRequest,
    body: web::Json<GradeSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    GRADING_SERVICE
        .grade_submission(&req, body.submission_id)
        .await
}

pub async fn grade_submission_by_path(
    req: HttpRequest,
    id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    GRADING_SERVICE.grade_submission(&req, id.0).await
}

// 配置路由
pub fn configure_grading_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/v1/grade-submission")
            .wrap(middlewares::RateLimit::grading())
            .wrap(middlewares::RequireRole::new_any(UserRole::staff_roles()))
            .wrap(middlewares::RequireJWT)
            .route(web::post().to(grade_submission)),
    );
}
