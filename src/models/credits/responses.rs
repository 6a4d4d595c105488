use super::entities::CreditTransaction;
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "credit.ts")]
pub struct CreditTransactionListResponse {
    pub items: Vec<CreditTransaction>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "credit.ts")]
pub struct AdjustCreditsResponse {
    pub credits_remaining: i64,
    pub transaction: CreditTransaction,
}
