use super::entities::SubscriptionPlan;
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "organization.ts")]
pub struct OrganizationListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
}

// 创建组织请求
//
// 同时给出 director_name 与 director_email 时，在同一事务中创建校长账号
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "organization.ts")]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub subdomain: String,
    pub education_level: Option<String>,
    pub subscription_plan: Option<SubscriptionPlan>,
    pub credits_per_period: Option<i64>,
    pub director_name: Option<String>,
    pub director_email: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "organization.ts")]
pub struct UpdateOrganizationRequest {
    pub name: Option<String>,
    pub education_level: Option<String>,
    pub subscription_plan: Option<SubscriptionPlan>,
    pub credits_per_period: Option<i64>,
    /// unix 秒
    pub renewal_date: Option<i64>,
}

// 手动调整积分（正数充值，负数扣减）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "organization.ts")]
pub struct AdjustCreditsRequest {
    pub amount: i64,
    pub description: Option<String>,
}

// 组织列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct OrganizationListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub search: Option<String>,
}

// 新组织（用于存储层）
#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    pub subdomain: String,
    pub education_level: Option<String>,
    pub subscription_plan: SubscriptionPlan,
    pub credits_remaining: i64,
    pub credits_per_period: i64,
    pub renewal_date: i64,
}

#[derive(Debug, Clone, Default)]
pub struct OrganizationUpdate {
    pub name: Option<String>,
    pub education_level: Option<String>,
    pub subscription_plan: Option<SubscriptionPlan>,
    pub credits_per_period: Option<i64>,
    pub renewal_date: Option<i64>,
}
