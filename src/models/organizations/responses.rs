use super::entities::Organization;
use crate::models::{common::PaginationInfo, users::entities::User};
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "organization.ts")]
pub struct OrganizationListResponse {
    pub items: Vec<Organization>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "organization.ts")]
pub struct CreateOrganizationResponse {
    pub organization: Organization,
    pub director: Option<User>,
}
