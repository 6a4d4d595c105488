//! CSV 批量导入学生

use std::collections::HashSet;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{StudentService, normalize_student};
use crate::config::AppConfig;
use crate::models::audit_logs::entities::{NewAuditLog, actions};
use crate::models::common::ImportSummary;
use crate::models::students::requests::CreateStudentRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::load_class;
use crate::services::{Rejection, ServiceResult, audit_logs, current_user, respond};
use crate::utils::csv_import::{CsvRow, parse_csv};
use crate::utils::multipart::read_single_file;

const COLUMNS: [&str; 3] = ["full_name", "student_email", "tutor_email"];

pub async fn import_students(
    service: &StudentService,
    request: &HttpRequest,
    class_id: i64,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    respond(import(service, request, class_id, payload).await)
}

async fn import(
    service: &StudentService,
    request: &HttpRequest,
    class_id: i64,
    mut payload: Multipart,
) -> ServiceResult<HttpResponse> {
    let user = current_user(request)?;
    let storage = service.get_storage(request)?;
    load_class(&storage, &user, class_id).await?;

    let file = read_single_file(&mut payload, AppConfig::get().upload.max_size).await?;
    if file.extension() != ".csv" {
        return Err(Rejection::bad_request(
            ErrorCode::FileTypeNotAllowed,
            "Only .csv files can be imported",
        ));
    }
    let rows = parse_csv(&file.data, &COLUMNS, &[])?;

    let mut known: HashSet<String> = storage
        .list_student_emails(class_id)
        .await?
        .into_iter()
        .collect();
    let (accepted, mut summary) = screen_rows(rows, &mut known);

    for (row, student) in accepted {
        if let Err(e) = storage.create_student(class_id, student).await {
            error!("Failed to import student at row {}: {}", row, e);
            summary.fail(row, "Failed to create student");
        } else {
            summary.created += 1;
        }
    }

    info!(
        "Imported {} of {} students into class {}",
        summary.created, summary.total, class_id
    );
    audit_logs::record(
        &storage,
        request,
        &user,
        NewAuditLog::new(actions::STUDENT_IMPORT, "class", Some(class_id)).details(
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

/// 校验并去重，返回待创建的行；`known` 为班级中已有的邮箱
fn screen_rows(
    rows: Vec<CsvRow>,
    known: &mut HashSet<String>,
) -> (Vec<(usize, CreateStudentRequest)>, ImportSummary) {
    let mut summary = ImportSummary {
        total: rows.len(),
        ..Default::default()
    };
    let mut accepted = Vec::new();

    for row in rows {
        let candidate = CreateStudentRequest {
            full_name: row.get("full_name").to_string(),
            student_email: row.get("student_email").to_string(),
            tutor_email: row.optional("tutor_email"),
        };
        let student = match normalize_student(candidate) {
            Ok(student) => student,
            Err((field, msg)) => {
                summary.skip(row.row, Some(field), msg);
                continue;
            }
        };
        if !known.insert(student.student_email.clone()) {
            summary.skip(row.row, Some("student_email"), "Duplicate student email");
            continue;
        }
        accepted.push((row.row, student));
    }
    (accepted, summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_rows_skips_invalid_and_duplicates() {
        let data = "full_name,student_email,tutor_email\n\
                    Ana,ana@school.test,\n\
                    ,nobody@school.test,\n\
                    Luis,not-an-email,\n\
                    Ana Bis,ANA@school.test,\n\
                    Marta,marta@school.test,padre@home.test\n\
                    Pedro,existing@school.test,\n";
        let rows = parse_csv(data.as_bytes(), &COLUMNS, &[]).unwrap();
        let mut known = HashSet::from(["existing@school.test".to_string()]);

        let (accepted, summary) = screen_rows(rows, &mut known);
        assert_eq!(summary.total, 6);
        assert_eq!(accepted.len(), 2);
        assert_eq!(summary.skipped, 4);
        assert_eq!(summary.errors.len(), 4);
        assert_eq!(accepted[0].0, 1);
        assert_eq!(accepted[1].1.tutor_email.as_deref(), Some("padre@home.test"));
        assert_eq!(
            summary.errors.iter().map(|e| e.row).collect::<Vec<_>>(),
            vec![2, 3, 4, 6]
        );
    }

    #[tokio::test]
    async fn test_import_rows_keep_summary_invariant() {
        let fixture = crate::test_support::Fixture::new(10, 10).await;
        let data = "full_name,student_email,tutor_email\n\
                    Luis,luis@alpha.test,\n\
                    Otra Ana,ana@alpha.test,\n\
                    ,x@alpha.test,\n";
        let rows = parse_csv(data.as_bytes(), &COLUMNS, &[]).unwrap();
        let mut known: HashSet<String> = fixture
            .storage
            .list_student_emails(fixture.class.id)
            .await
            .unwrap()
            .into_iter()
            .collect();

        let (accepted, mut summary) = screen_rows(rows, &mut known);
        for (_, student) in accepted {
            fixture
                .storage
                .create_student(fixture.class.id, student)
                .await
                .unwrap();
            summary.created += 1;
        }

        assert_eq!(summary.created, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(
            summary.created + summary.skipped + summary.failed,
            summary.total
        );
        let emails = fixture
            .storage
            .list_student_emails(fixture.class.id)
            .await
            .unwrap();
        assert_eq!(emails.len(), 2);
    }
}
