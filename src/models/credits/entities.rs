use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 积分流水类型
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "credit.ts")]
pub enum CreditTransactionKind {
    Grading,    // 评分扣减
    Refund,     // 评分失败退还
    Renewal,    // 周期续期
    Adjustment, // 手动调整
}

impl std::fmt::Display for CreditTransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreditTransactionKind::Grading => write!(f, "grading"),
            CreditTransactionKind::Refund => write!(f, "refund"),
            CreditTransactionKind::Renewal => write!(f, "renewal"),
            CreditTransactionKind::Adjustment => write!(f, "adjustment"),
        }
    }
}

impl std::str::FromStr for CreditTransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grading" => Ok(CreditTransactionKind::Grading),
            "refund" => Ok(CreditTransactionKind::Refund),
            "renewal" => Ok(CreditTransactionKind::Renewal),
            "adjustment" => Ok(CreditTransactionKind::Adjustment),
            _ => Err(format!("Invalid credit transaction kind: {s}")),
        }
    }
}

// 积分流水
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "credit.ts")]
pub struct CreditTransaction {
    pub id: i64,
    pub organization_id: i64,
    pub user_id: Option<i64>,
    pub submission_id: Option<i64>,
    pub kind: CreditTransactionKind,
    /// 有符号：扣减为负
    pub amount: i64,
    pub balance_after: i64,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 一次成功的积分预留（组织余额与教师月度用量已同时扣减）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditReservation {
    pub organization_id: i64,
    pub teacher_id: i64,
    pub submission_id: i64,
    pub cost: i64,
    pub credits_remaining: i64,
    pub monthly_credits_used: i64,
    pub monthly_credit_limit: i64,
    /// 预留时组织的续期日期（unix 秒）
    pub renewal_date: i64,
}
