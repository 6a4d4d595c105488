use super::entities::CreditTransactionKind;
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "credit.ts")]
pub struct CreditTransactionListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub kind: Option<CreditTransactionKind>,
}

// 积分流水查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct CreditTransactionListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub organization_id: i64,
    pub kind: Option<CreditTransactionKind>,
}
