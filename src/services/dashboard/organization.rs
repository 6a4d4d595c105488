use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{DashboardService, average_score_percent};
use crate::config::AppConfig;
use crate::models::dashboard::entities::StatsScope;
use crate::models::dashboard::requests::OrganizationDashboardParams;
use crate::models::dashboard::responses::{OrganizationDashboardResponse, TeacherUsage};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::ensure_organization_access;
use crate::services::{Rejection, ServiceResult, current_user, respond};

pub async fn organization_dashboard(
    service: &DashboardService,
    request: &HttpRequest,
    query: OrganizationDashboardParams,
) -> ActixResult<HttpResponse> {
    respond(organization(service, request, query).await)
}

async fn organization(
    service: &DashboardService,
    request: &HttpRequest,
    query: OrganizationDashboardParams,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;

    let organization_id = if user.is_superadmin() {
        query.organization_id
    } else {
        user.organization_id()
    }
    .ok_or_else(|| Rejection::bad_request(ErrorCode::BadRequest, "organization_id is required"))?;
    ensure_organization_access(&user, organization_id)?;

    let organization = storage
        .get_organization_by_id(organization_id)
        .await?
        .ok_or_else(|| {
            Rejection::not_found(ErrorCode::OrganizationNotFound, "Organization not found")
        })?;

    let scope = StatsScope::organization(organization_id);
    let period_start =
        organization.renewal_date.timestamp() - AppConfig::get().credits.period_days * 86_400;
    let teacher_usage = storage
        .list_teacher_usage(organization_id)
        .await?
        .into_iter()
        .map(|row| TeacherUsage {
            teacher_id: row.teacher_id,
            full_name: row.full_name,
            monthly_credits_used: row.monthly_credits_used,
            monthly_credit_limit: row.monthly_credit_limit,
        })
        .collect();

    let response = OrganizationDashboardResponse {
        organization_id,
        credits_used_this_period: storage
            .sum_grading_credits_since(organization_id, period_start)
            .await?,
        users_by_role: storage.count_profiles_by_role(Some(organization_id)).await?,
        class_count: storage.count_classes(scope).await?,
        exam_count: storage.count_exams(scope).await?,
        submissions: storage.count_submissions_by_status(scope).await?,
        average_score_percent: average_score_percent(&storage.list_grade_scores(scope).await?),
        teacher_usage,
        organization_name: organization.name,
        credits_remaining: organization.credits_remaining,
        credits_per_period: organization.credits_per_period,
        renewal_date: organization.renewal_date,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Organization dashboard retrieved successfully",
    )))
}
