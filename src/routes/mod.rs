pub mod audit_logs;

pub mod auth;

pub mod classes;

pub mod dashboard;

pub mod exams;

pub mod files;

pub mod grading;

pub mod organizations;

pub mod students;

pub mod submissions;

pub mod users;

pub use audit_logs::configure_audit_log_routes;
pub use auth::configure_auth_routes;
pub use classes::configure_classes_routes;
pub use dashboard::configure_dashboard_routes;
pub use exams::configure_exam_routes;
pub use files::configure_file_routes;
pub use grading::configure_grading_routes;
pub use organizations::configure_organization_routes;
pub use students::configure_student_routes;
pub use submissions::configure_submissions_routes;
pub use users::configure_user_routes;

use actix_web::web;

/// 按匹配优先级注册全部路由
/// 嵌套前缀（/classes/{id}/students、/exams/{id}/submissions）必须先于其父级注册
pub fn configure_all(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_auth_routes)
        .configure(configure_organization_routes)
        .configure(configure_user_routes)
        .configure(configure_student_routes)
        .configure(configure_submissions_routes)
        .configure(configure_exam_routes)
        .configure(configure_classes_routes)
        .configure(configure_file_routes)
        .configure(configure_grading_routes)
        .configure(configure_dashboard_routes)
        .configure(configure_audit_log_routes);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::{App, test, web};
    use serde_json::{Value, json};

    use super::configure_all;
    use crate::models::ErrorCode;
    use crate::models::submissions::entities::SubmissionStatus;
    use crate::models::users::entities::UserRole;
    use crate::models::users::requests::NewUser;
    use crate::services::grading::GradingModel;
    use crate::storage::{BlobStore, Storage};
    use crate::test_support::{Fixture, StubModel, VALID_REPORT, bearer};
    use crate::utils::password::hash_password;

    macro_rules! grader_app {
        ($storage:expr, $blobs:expr, $model:expr) => {{
            let storage: Arc<dyn Storage> = $storage;
            let blobs: Arc<dyn BlobStore> = $blobs;
            let model: Arc<dyn GradingModel> = Arc::new($model);
            test::init_service(
                App::new()
                    .app_data(web::Data::new(storage))
                    .app_data(web::Data::new(blobs))
                    .app_data(web::Data::new(model))
                    .configure(configure_all),
            )
            .await
        }};
    }

    fn grade_request(fixture: &Fixture, submission_id: i64) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/v1/grade-submission")
            .insert_header((AUTHORIZATION, bearer(&fixture.teacher)))
            .set_json(json!({ "submissionId": submission_id }))
    }

    async fn org_credits(fixture: &Fixture) -> i64 {
        fixture
            .storage
            .get_organization_by_id(fixture.organization.id)
            .await
            .unwrap()
            .unwrap()
            .credits_remaining
    }

    #[actix_web::test]
    async fn test_login_without_session() {
        let fixture = Fixture::new(10, 5).await;
        fixture
            .storage
            .create_user(NewUser {
                email: "director@alpha.test".to_string(),
                password_hash: hash_password("Correct-Horse-9").unwrap(),
                full_name: "Directora".to_string(),
                role: UserRole::Director,
                organization_id: Some(fixture.organization.id),
                monthly_credit_limit: 0,
            })
            .await
            .unwrap();
        let app = grader_app!(
            fixture.storage.clone(),
            fixture.blobs.clone(),
            StubModel::replying(VALID_REPORT)
        );

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .peer_addr("10.20.0.1:40000".parse().unwrap())
                .set_json(json!({ "email": "director@alpha.test", "password": "wrong" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], ErrorCode::AuthFailed as i32);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .peer_addr("10.20.0.1:40001".parse().unwrap())
                .set_json(json!({
                    "email": "Director@alpha.test",
                    "password": "Correct-Horse-9"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], 0);
        assert!(body["data"]["access_token"].as_str().is_some());
    }

    #[actix_web::test]
    async fn test_grading_requires_session() {
        let fixture = Fixture::new(10, 5).await;
        let (submission, _) = fixture.submission_with_pages(1).await;
        let app = grader_app!(
            fixture.storage.clone(),
            fixture.blobs.clone(),
            StubModel::replying(VALID_REPORT)
        );

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/grade-submission")
                .set_json(json!({ "submission_id": submission.id }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(org_credits(&fixture).await, 10);
    }

    #[actix_web::test]
    async fn test_grading_over_org_balance_returns_402() {
        let fixture = Fixture::new(10, 100).await;
        let (submission, _) = fixture.submission_with_pages(12).await;
        let model = StubModel::replying(VALID_REPORT);
        let calls = model.calls();
        let app = grader_app!(fixture.storage.clone(), fixture.blobs.clone(), model);

        let request = grade_request(&fixture, submission.id).to_request();
        let res = test::call_service(&app, request).await;
        assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], ErrorCode::InsufficientCredits as i32);
        assert!(body.get("data").is_none());

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(org_credits(&fixture).await, 10);
        let stored = fixture
            .storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Pending);
    }

    #[actix_web::test]
    async fn test_grading_over_monthly_limit_returns_403() {
        let fixture = Fixture::new(100, 2).await;
        let (submission, _) = fixture.submission_with_pages(3).await;
        let app = grader_app!(
            fixture.storage.clone(),
            fixture.blobs.clone(),
            StubModel::replying(VALID_REPORT)
        );

        let request = grade_request(&fixture, submission.id).to_request();
        let res = test::call_service(&app, request).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], ErrorCode::MonthlyLimitExceeded as i32);
        assert_eq!(org_credits(&fixture).await, 100);
    }

    #[actix_web::test]
    async fn test_three_page_submission_within_limits() {
        // 组织余额 10，教师月度额度 5、已用 0
        let fixture = Fixture::new(10, 5).await;
        let (submission, _) = fixture.submission_with_pages(3).await;
        let app = grader_app!(
            fixture.storage.clone(),
            fixture.blobs.clone(),
            StubModel::replying(VALID_REPORT)
        );

        let request = grade_request(&fixture, submission.id).to_request();
        let res = test::call_service(&app, request).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], 0);
        assert_eq!(body["data"]["credits_used"], 3);
        assert_eq!(body["data"]["credits_remaining"], 7);
        assert_eq!(body["data"]["monthly_credits_used"], 3);
        assert_eq!(body["data"]["monthly_credit_limit"], 5);

        assert_eq!(org_credits(&fixture).await, 7);
        let teacher = fixture
            .storage
            .get_user_by_id(fixture.teacher.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(teacher.profile.monthly_credits_used, 3);
        let stored = fixture
            .storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Graded);
        let grade = fixture
            .storage
            .get_grade_by_submission_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(body["data"]["grade_id"], grade.id);
    }
}
