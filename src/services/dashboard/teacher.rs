use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{DashboardService, average_score_percent};
use crate::models::{ApiResponse, ErrorCode};
use crate::models::dashboard::entities::StatsScope;
use crate::models::dashboard::responses::TeacherDashboardResponse;
use crate::services::{Rejection, ServiceResult, current_user, respond};

pub async fn teacher_dashboard(
    service: &DashboardService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    respond(teacher(service, request).await)
}

async fn teacher(service: &DashboardService, request: &HttpRequest) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    // 月度用量以数据库为准
    let user = storage
        .get_user_by_id(user.id)
        .await?
        .ok_or_else(|| Rejection::not_found(ErrorCode::UserNotFound, "User not found"))?;
    let scope = StatsScope::teacher(user.id);

    let response = TeacherDashboardResponse {
        class_count: storage.count_classes(scope).await?,
        student_count: storage.count_students(scope).await?,
        exam_count: storage.count_exams(scope).await?,
        submissions: storage.count_submissions_by_status(scope).await?,
        average_score_percent: average_score_percent(&storage.list_grade_scores(scope).await?),
        monthly_credits_used: user.profile.monthly_credits_used,
        monthly_credit_limit: user.profile.monthly_credit_limit,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Teacher dashboard retrieved successfully",
    )))
}
