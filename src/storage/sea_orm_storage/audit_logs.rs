//! 审计日志存储操作

use super::SeaOrmStorage;
use crate::entity::audit_logs::{ActiveModel, Column, Entity as AuditLogs};
use crate::errors::{GraderError, Result};
use crate::models::{
    PaginationInfo,
    audit_logs::{
        entities::{AuditLog, NewAuditLog},
        requests::AuditLogListQuery,
        responses::AuditLogListResponse,
    },
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    pub async fn create_audit_log_impl(&self, log: NewAuditLog) -> Result<AuditLog> {
        let details = match log.details {
            Some(value) => Some(serde_json::to_string(&value)?),
            None => None,
        };

        let model = ActiveModel {
            actor_id: Set(log.actor_id),
            organization_id: Set(log.organization_id),
            action: Set(log.action),
            target_type: Set(log.target_type),
            target_id: Set(log.target_id),
            details: Set(details),
            ip_address: Set(log.ip_address),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("写入审计日志失败: {e}")))?;

        Ok(result.into_audit_log())
    }

    pub async fn list_audit_logs_with_pagination_impl(
        &self,
        query: AuditLogListQuery,
    ) -> Result<AuditLogListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(20).clamp(1, 100) as u64;

        let mut select = AuditLogs::find();

        if let Some(organization_id) = query.organization_id {
            select = select.filter(Column::OrganizationId.eq(organization_id));
        }

        if let Some(ref action) = query.action {
            select = select.filter(Column::Action.eq(action.as_str()));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| GraderError::database_operation(format!("查询审计日志总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| GraderError::database_operation(format!("查询审计日志页数失败: {e}")))?;

        let logs = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询审计日志失败: {e}")))?;

        Ok(AuditLogListResponse {
            items: logs.into_iter().map(|m| m.into_audit_log()).collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audit_logs::entities::actions;
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_audit_log_filters_by_organization_and_action() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();

        storage
            .create_audit_log(
                NewAuditLog::new(actions::USER_CREATE, "user", Some(7))
                    .actor(1, Some(10))
                    .details(serde_json::json!({ "email": "a@b.edu" })),
            )
            .await
            .unwrap();
        storage
            .create_audit_log(NewAuditLog::new(actions::CREDITS_ADJUST, "organization", Some(10)).actor(1, Some(10)))
            .await
            .unwrap();
        storage
            .create_audit_log(NewAuditLog::new(actions::USER_CREATE, "user", Some(8)).actor(2, Some(11)))
            .await
            .unwrap();

        let page = storage
            .list_audit_logs_with_pagination(AuditLogListQuery {
                organization_id: Some(10),
                action: Some(actions::USER_CREATE.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.items[0].target_id, Some(7));
        assert_eq!(
            page.items[0].details.as_ref().and_then(|d| d["email"].as_str()),
            Some("a@b.edu")
        );
    }
}
