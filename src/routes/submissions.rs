use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, guard, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::submissions::requests::{CreateSubmissionRequest, SubmissionListParams};
use crate::models::users::entities::UserRole;
use crate::services::SubmissionService;
use crate::utils::{SafeExamIdI64, SafeIDI64};

// 懒加载的全局 SubmissionService 实例
static SUBMISSION_SERVICE: Lazy<SubmissionService> = Lazy::new(SubmissionService::new_lazy);

// 列出考试下的提交
pub async fn list_submissions(
    req: HttpRequest,
    exam_id: SafeExamIdI64,
    query: web::Query<SubmissionListParams>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .list_submissions(&req, exam_id.0, query.into_inner())
        .await
}

// 创建提交
pub async fn create_submission(
    req: HttpRequest,
    exam_id: SafeExamIdI64,
    body: web::Json<CreateSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .create_submission(&req, exam_id.0, body.into_inner())
        .await
}

// 获取提交详情
pub async fn get_submission(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE.get_submission(&req, id.0).await
}

pub async fn delete_submission(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE.delete_submission(&req, id.0).await
}

// 获取评分结果
pub async fn get_grade(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE.get_grade(&req, id.0).await
}

// 配置路由
// 需在考试路由之前注册，否则 /api/v1/exams/{id} 会先匹配
pub fn configure_submissions_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/exams/{exam_id}/submissions")
            .wrap(middlewares::RequireRole::new_any(UserRole::staff_roles()))
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_submissions))
            .route("", web::post().to(create_submission)),
    );

    cfg.service(
        web::scope("/api/v1/submissions")
            .wrap(middlewares::RequireRole::new_any(UserRole::staff_roles()))
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/{id}/grade")
                    .guard(guard::Post())
                    .wrap(middlewares::RateLimit::grading())
                    .route(web::post().to(super::grading::grade_submission_by_path)),
            )
            .route("/{id}/grade", web::get().to(get_grade))
            .route("/{id}", web::get().to(get_submission))
            .route("/{id}", web::delete().to(delete_submission)),
    );
}
