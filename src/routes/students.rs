use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::students::requests::{CreateStudentRequest, StudentListParams};
use crate::models::users::entities::UserRole;
use crate::services::StudentService;
use crate::utils::{SafeClassIdI64, SafeStudentIdI64};

static STUDENT_SERVICE: Lazy<StudentService> = Lazy::new(StudentService::new_lazy);

pub async fn list_students(
    req: HttpRequest,
    class_id: SafeClassIdI64,
    query: web::Query<StudentListParams>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .list_students(&req, class_id.0, query.into_inner())
        .await
}

pub async fn create_student(
    req: HttpRequest,
    class_id: SafeClassIdI64,
    data: web::Json<CreateStudentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .create_student(&req, class_id.0, data.into_inner())
        .await
}

pub async fn delete_student(
    req: HttpRequest,
    class_id: SafeClassIdI64,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .delete_student(&req, class_id.0, student_id.0)
        .await
}

pub async fn import_students(
    req: HttpRequest,
    class_id: SafeClassIdI64,
    payload: actix_multipart::Multipart,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .import_students(&req, class_id.0, payload)
        .await
}

// 配置路由
pub fn configure_student_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classes/{class_id}/students")
            .wrap(middlewares::RequireRole::new_any(UserRole::staff_roles()))
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_students))
            .route("", web::post().to(create_student))
            .service(
                web::resource("/import")
                    .wrap(middlewares::RateLimit::import())
                    .route(web::post().to(import_students)),
            )
            .route("/{student_id}", web::delete().to(delete_student)),
    );
}
