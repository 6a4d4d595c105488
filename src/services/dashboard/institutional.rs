use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::debug;

use super::DashboardService;
use crate::models::ApiResponse;
use crate::models::dashboard::entities::StatsScope;
use crate::models::dashboard::responses::{
    InstitutionalDashboardResponse, InstitutionalTotals, OrganizationSummary,
};
use crate::services::{ServiceResult, cache_from_request, respond};

const CACHE_KEY: &str = "dashboard:institutional";
const CACHE_TTL: u64 = 300;

pub async fn institutional_dashboard(
    service: &DashboardService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    respond(institutional(service, request).await)
}

async fn institutional(
    service: &DashboardService,
    request: &HttpRequest,
) -> ServiceResult<HttpResponse> {
    let cache = cache_from_request(request);
    if let Some(cache) = &cache
        && let Some(cached) = cache
            .get_json::<InstitutionalDashboardResponse>(CACHE_KEY)
            .await
    {
        debug!("Institutional dashboard served from cache");
        return Ok(HttpResponse::Ok().json(ApiResponse::success(
            cached,
            "Institutional dashboard retrieved successfully",
        )));
    }

    let storage = service.get_storage(request)?;
    let mut organizations = Vec::new();
    let mut totals = InstitutionalTotals::default();

    for organization in storage.list_all_organizations().await? {
        let scope = StatsScope::organization(organization.id);
        let user_count = storage
            .count_profiles_by_role(Some(organization.id))
            .await?
            .iter()
            .map(|row| row.count)
            .sum::<i64>();
        let class_count = storage.count_classes(scope).await?;
        let graded_submissions = storage.count_submissions_by_status(scope).await?.graded;

        totals.organizations += 1;
        totals.users += user_count;
        totals.classes += class_count;
        totals.graded_submissions += graded_submissions;
        totals.credits_remaining += organization.credits_remaining;

        organizations.push(OrganizationSummary {
            organization_id: organization.id,
            name: organization.name,
            subdomain: organization.subdomain,
            subscription_plan: organization.subscription_plan.to_string(),
            credits_remaining: organization.credits_remaining,
            user_count,
            class_count,
            graded_submissions,
        });
    }

    let response = InstitutionalDashboardResponse {
        organizations,
        totals,
        generated_at: chrono::Utc::now(),
    };
    if let Some(cache) = &cache {
        cache.insert_json(CACHE_KEY, &response, CACHE_TTL).await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Institutional dashboard retrieved successfully",
    )))
}
