pub mod list;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::warn;

use super::{ServiceResult, client_ip, storage_from_request};
use crate::models::audit_logs::entities::NewAuditLog;
use crate::models::audit_logs::requests::AuditLogListParams;
use crate::models::users::entities::User;
use crate::storage::Storage;

pub struct AuditLogService {
    storage: Option<Arc<dyn Storage>>,
}

impl AuditLogService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    pub async fn list_audit_logs(
        &self,
        request: &HttpRequest,
        query: AuditLogListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_audit_logs(self, request, query).await
    }
}

/// 记录一条审计日志，失败只写日志
pub async fn record(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    actor: &User,
    log: NewAuditLog,
) {
    let log = log
        .actor(actor.id, actor.organization_id())
        .ip(client_ip(request));
    let action = log.action.clone();
    if let Err(e) = storage.create_audit_log(log).await {
        warn!("Failed to write audit log {}: {}", action, e);
    }
}
