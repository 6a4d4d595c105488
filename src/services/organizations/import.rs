//! CSV 批量创建组织（每行一个组织及其校长账号）

use std::collections::HashSet;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{OrganizationService, director_draft, new_organization};
use crate::config::AppConfig;
use crate::models::audit_logs::entities::{NewAuditLog, actions};
use crate::models::common::ImportSummary;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{Rejection, ServiceResult, audit_logs, current_user, email, respond};
use crate::utils::csv_import::parse_csv;
use crate::utils::multipart::read_single_file;

const COLUMNS: [&str; 4] = ["name", "subdomain", "director_name", "director_email"];
const OPTIONAL_COLUMNS: [&str; 1] = ["education_level"];

pub async fn import_organizations(
    service: &OrganizationService,
    request: &HttpRequest,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    respond(import(service, request, payload).await)
}

async fn import(
    service: &OrganizationService,
    request: &HttpRequest,
    mut payload: Multipart,
) -> ServiceResult<HttpResponse> {
    let actor = current_user(request)?;
    let storage = service.get_storage(request)?;

    let file = read_single_file(&mut payload, AppConfig::get().upload.max_size).await?;
    if file.extension() != ".csv" {
        return Err(Rejection::bad_request(
            ErrorCode::FileTypeNotAllowed,
            "Only .csv files can be imported",
        ));
    }
    let rows = parse_csv(&file.data, &COLUMNS, &OPTIONAL_COLUMNS)?;

    let mut summary = ImportSummary {
        total: rows.len(),
        ..Default::default()
    };
    let mut seen_subdomains = HashSet::new();
    let mut seen_emails = HashSet::new();

    for row in rows {
        let organization = match new_organization(
            row.get("name"),
            row.get("subdomain"),
            row.optional("education_level"),
            None,
            None,
        ) {
            Ok(organization) => organization,
            Err(invalid) => {
                summary.skip(row.row, Some(invalid.field), invalid.message);
                continue;
            }
        };
        let draft = match director_draft(row.get("director_name"), row.get("director_email")).await?
        {
            Ok(draft) => draft,
            Err(invalid) => {
                summary.skip(row.row, Some(invalid.field), invalid.message);
                continue;
            }
        };

        if !seen_subdomains.insert(organization.subdomain.clone())
            || storage
                .get_organization_by_subdomain(&organization.subdomain)
                .await?
                .is_some()
        {
            summary.skip(row.row, Some("subdomain"), "Subdomain already exists");
            continue;
        }
        if !seen_emails.insert(draft.user.email.clone())
            || storage.get_user_by_email(&draft.user.email).await?.is_some()
        {
            summary.skip(row.row, Some("director_email"), "Email already exists");
            continue;
        }

        match storage
            .create_organization_with_director(organization, draft.user)
            .await
        {
            Ok((organization, director)) => {
                summary.created += 1;
                email::send_welcome_email(
                    &director.profile.full_name,
                    &director.email,
                    &draft.password,
                )
                .await;
                info!("Organization {} imported", organization.subdomain);
            }
            Err(e) => {
                error!("Failed to import organization at row {}: {}", row.row, e);
                summary.fail(row.row, "Failed to create organization");
            }
        }
    }

    audit_logs::record(
        &storage,
        request,
        &actor,
        NewAuditLog::new(actions::ORGANIZATION_IMPORT, "organization", None).details(
            serde_json::json!({
                "total": summary.total,
                "created": summary.created,
                "skipped": summary.skipped,
                "failed": summary.failed,
            }),
        ),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(summary, "Import completed")))
}
