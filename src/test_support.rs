//! 测试辅助：内存数据库、内存文件存储、模型桩与 PDF 生成

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lopdf::{Document, Object, Stream, dictionary};
use tokio::sync::RwLock;

use crate::errors::{GraderError, Result};
use crate::models::classes::entities::Class;
use crate::models::classes::requests::CreateClassRequest;
use crate::models::exams::entities::{Exam, ExamType};
use crate::models::exams::requests::NewExam;
use crate::models::organizations::entities::{Organization, SubscriptionPlan};
use crate::models::organizations::requests::NewOrganization;
use crate::models::students::entities::Student;
use crate::models::students::requests::CreateStudentRequest;
use crate::models::submissions::entities::Submission;
use crate::models::users::entities::{User, UserRole};
use crate::models::users::requests::NewUser;
use crate::services::grading::GradingModel;
use crate::storage::sea_orm_storage::SeaOrmStorage;
use crate::storage::{BlobStore, Storage};

pub const VALID_REPORT: &str = r#"{
    "informe_evaluacion": {
        "metadatos": {"alumno": "Ana", "curso": "3B"},
        "resumen_general": {
            "puntuacion_obtenida": 7.5,
            "puntuacion_maxima": 10,
            "comentario_general": "Buen trabajo"
        },
        "evaluacion_detallada": [
            {"pregunta": "1", "puntuacion_obtenida": 4, "puntuacion_maxima": 5, "comentario": "Bien"},
            {"pregunta": "2", "puntuacion_obtenida": 3.5, "puntuacion_maxima": 5, "comentario": "Incompleto"}
        ]
    }
}"#;

/// 生成含 n 页空白页的 PDF
pub fn build_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages);
    for _ in 0..pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        });
        kids.push(page_id.into());
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, name: &str, data: &[u8]) -> Result<()> {
        self.blobs
            .write()
            .await
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| GraderError::file_not_found(format!("文件 {name} 不存在")))
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.blobs.write().await.remove(name);
        Ok(())
    }
}

/// 模型桩：返回固定文本或模拟服务故障
pub struct StubModel {
    reply: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl StubModel {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait::async_trait]
impl GradingModel for StubModel {
    async fn evaluate(&self, _prompt: &str, _solution: &[u8], _submission: &[u8]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .ok_or_else(|| GraderError::ai_service("stub model unavailable"))
    }
}

/// `Authorization` 头的值
pub fn bearer(user: &User) -> String {
    let pair = user.generate_token_pair(None).unwrap();
    format!("Bearer {}", pair.access_token)
}

pub fn new_user(email: &str, role: UserRole, organization_id: Option<i64>, limit: i64) -> NewUser {
    NewUser {
        email: email.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        full_name: email.split('@').next().unwrap_or(email).to_string(),
        role,
        organization_id,
        monthly_credit_limit: limit,
    }
}

pub fn new_organization(subdomain: &str, credits: i64) -> NewOrganization {
    NewOrganization {
        name: format!("School {subdomain}"),
        subdomain: subdomain.to_string(),
        education_level: Some("secondary".to_string()),
        subscription_plan: SubscriptionPlan::Basic,
        credits_remaining: credits,
        credits_per_period: credits,
        renewal_date: chrono::Utc::now().timestamp() + 30 * 86_400,
    }
}

/// 组织 + 教师 + 班级 + 学生 + 带标准答案的考试
pub struct Fixture {
    pub storage: Arc<dyn Storage>,
    pub blobs: Arc<dyn BlobStore>,
    pub organization: Organization,
    pub teacher: User,
    pub class: Class,
    pub student: Student,
    pub exam: Exam,
}

impl Fixture {
    pub async fn new(credits: i64, monthly_limit: i64) -> Self {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::new_in_memory().await.unwrap());
        let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::default());

        let organization = storage
            .create_organization(new_organization("alpha", credits))
            .await
            .unwrap();
        let teacher = storage
            .create_user(new_user(
                "teacher@alpha.test",
                UserRole::Teacher,
                Some(organization.id),
                monthly_limit,
            ))
            .await
            .unwrap();
        let class = storage
            .create_class(
                organization.id,
                teacher.id,
                CreateClassRequest {
                    teacher_id: None,
                    name: "3B".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();
        let student = storage
            .create_student(
                class.id,
                CreateStudentRequest {
                    full_name: "Ana Pérez".to_string(),
                    student_email: "ana@alpha.test".to_string(),
                    tutor_email: None,
                },
            )
            .await
            .unwrap();

        let mut fixture = Self {
            storage,
            blobs,
            organization,
            teacher,
            class,
            student,
            exam: Exam {
                id: 0,
                class_id: 0,
                organization_id: 0,
                teacher_id: 0,
                title: String::new(),
                exam_type: ExamType::Exam,
                solution_file_token: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
        };

        let solution_token = fixture.store_file(build_pdf(2)).await;
        fixture.exam = fixture
            .storage
            .create_exam(NewExam {
                class_id: fixture.class.id,
                organization_id: fixture.organization.id,
                teacher_id: fixture.teacher.id,
                title: "Parcial 1".to_string(),
                exam_type: ExamType::Exam,
                solution_file_token: Some(solution_token),
            })
            .await
            .unwrap();
        fixture
    }

    /// 写入文件内容与文件记录，返回文件令牌
    pub async fn store_file(&self, data: Vec<u8>) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        let stored_name = format!("{token}.pdf");
        self.blobs.put(&stored_name, &data).await.unwrap();
        self.storage
            .create_file(
                &token,
                "upload.pdf",
                &stored_name,
                data.len() as i64,
                "application/pdf",
                self.teacher.id,
            )
            .await
            .unwrap();
        token
    }

    pub async fn submission_with_bytes(&self, data: Vec<u8>) -> (Submission, Exam) {
        let token = self.store_file(data).await;
        let submission = self
            .storage
            .create_submission(self.exam.id, self.student.id, &token)
            .await
            .unwrap();
        (submission, self.exam.clone())
    }

    pub async fn submission_with_pages(&self, pages: usize) -> (Submission, Exam) {
        self.submission_with_bytes(build_pdf(pages)).await
    }
}
