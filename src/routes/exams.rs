use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::exams::requests::{CreateExamRequest, ExamListParams, UpdateExamRequest};
use crate::models::users::entities::UserRole;
use crate::services::ExamService;
use crate::utils::{SafeClassIdI64, SafeIDI64};

static EXAM_SERVICE: Lazy<ExamService> = Lazy::new(ExamService::new_lazy);

pub async fn list_exams(
    req: HttpRequest,
    class_id: SafeClassIdI64,
    query: web::Query<ExamListParams>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE
        .list_exams(&req, class_id.0, query.into_inner())
        .await
}

pub async fn create_exam(
    req: HttpRequest,
    class_id: SafeClassIdI64,
    data: web::Json<CreateExamRequest>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE
        .create_exam(&req, class_id.0, data.into_inner())
        .await
}

pub async fn get_exam(req: HttpRequest, exam_id: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.get_exam(&req, exam_id.0).await
}

pub async fn update_exam(
    req: HttpRequest,
    exam_id: SafeIDI64,
    data: web::Json<UpdateExamRequest>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE
        .update_exam(&req, exam_id.0, data.into_inner())
        .await
}

pub async fn delete_exam(req: HttpRequest, exam_id: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.delete_exam(&req, exam_id.0).await
}

// 配置路由
pub fn configure_exam_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classes/{class_id}/exams")
            .wrap(middlewares::RequireRole::new_any(UserRole::staff_roles()))
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_exams))
            .route("", web::post().to(create_exam)),
    );
    cfg.service(
        web::scope("/api/v1/exams/{id}")
            .wrap(middlewares::RequireRole::new_any(UserRole::staff_roles()))
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(get_exam))
            .route("", web::put().to(update_exam))
            .route("", web::delete().to(delete_exam)),
    );
}
