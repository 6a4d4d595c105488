pub mod engine;
pub mod gemini;
pub mod grade;
pub mod pdf;
pub mod report;

pub use engine::GradingEngine;
pub use gemini::GeminiClient;

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use super::{ServiceResult, blobs_from_request, storage_from_request};
use crate::config::AppConfig;
use crate::errors::{GraderError, Result};

/// 多模态评分模型：提示词 + 标准答案 PDF + 学生答卷 PDF → 报告文本
#[async_trait::async_trait]
pub trait GradingModel: Send + Sync {
    async fn evaluate(
        &self,
        prompt: &str,
        solution_pdf: &[u8],
        submission_pdf: &[u8],
    ) -> Result<String>;
}

pub struct GradingService;

impl GradingService {
    pub fn new_lazy() -> Self {
        Self
    }

    pub(crate) fn get_engine(&self, request: &HttpRequest) -> ServiceResult<GradingEngine> {
        let storage = storage_from_request(request)?;
        let blobs = blobs_from_request(request)?;
        let model = request
            .app_data::<web::Data<Arc<dyn GradingModel>>>()
            .map(|data| data.get_ref().clone())
            .ok_or_else(|| GraderError::configuration("Grading model not found in app data"))?;
        // 模型调用超时后再留一分钟余量，之后的 processing 视为遗留占用
        let claim_ttl = i64::try_from(AppConfig::get().ai.timeout)
            .unwrap_or(i64::MAX)
            .saturating_add(60);
        Ok(GradingEngine::new(storage, blobs, model).with_claim_ttl(claim_ttl))
    }

    // 对提交执行 AI 评分
    pub async fn grade_submission(
        &self,
        request: &HttpRequest,
        submission_id: i64,
    ) -> ActixResult<HttpResponse> {
        grade::grade_submission(self, request, submission_id).await
    }
}
