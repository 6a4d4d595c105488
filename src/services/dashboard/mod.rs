pub mod institutional;
pub mod organization;
pub mod teacher;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::{ServiceResult, storage_from_request};
use crate::models::dashboard::requests::OrganizationDashboardParams;
use crate::storage::Storage;

pub struct DashboardService {
    storage: Option<Arc<dyn Storage>>,
}

impl DashboardService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    pub async fn teacher_dashboard(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        teacher::teacher_dashboard(self, request).await
    }

    pub async fn organization_dashboard(
        &self,
        request: &HttpRequest,
        query: OrganizationDashboardParams,
    ) -> ActixResult<HttpResponse> {
        organization::organization_dashboard(self, request, query).await
    }

    pub async fn institutional_dashboard(
        &self,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        institutional::institutional_dashboard(self, request).await
    }
}

/// 平均得分率（0-100，保留两位小数），忽略满分为 0 的成绩
pub(crate) fn average_score_percent(scores: &[(f64, f64)]) -> Option<f64> {
    let ratios: Vec<f64> = scores
        .iter()
        .filter(|(_, possible)| *possible > 0.0)
        .map(|(obtained, possible)| obtained / possible * 100.0)
        .collect();
    if ratios.is_empty() {
        return None;
    }
    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_score_percent() {
        assert_eq!(average_score_percent(&[]), None);
        assert_eq!(average_score_percent(&[(3.0, 0.0)]), None);
        assert_eq!(
            average_score_percent(&[(7.5, 10.0), (4.0, 8.0), (1.0, 0.0)]),
            Some(62.5)
        );
        assert_eq!(average_score_percent(&[(1.0, 3.0)]), Some(33.33));
    }
}
