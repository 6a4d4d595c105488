use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 订阅计划
#[derive(Debug, Clone, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "organization.ts")]
pub enum SubscriptionPlan {
    Free,
    Basic,
    Pro,
    Enterprise,
}

impl<'de> Deserialize<'de> for SubscriptionPlan {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的订阅计划: '{s}'. 支持的计划: free, basic, pro, enterprise"
            ))
        })
    }
}

impl std::fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionPlan::Free => write!(f, "free"),
            SubscriptionPlan::Basic => write!(f, "basic"),
            SubscriptionPlan::Pro => write!(f, "pro"),
            SubscriptionPlan::Enterprise => write!(f, "enterprise"),
        }
    }
}

impl std::str::FromStr for SubscriptionPlan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(SubscriptionPlan::Free),
            "basic" => Ok(SubscriptionPlan::Basic),
            "pro" => Ok(SubscriptionPlan::Pro),
            "enterprise" => Ok(SubscriptionPlan::Enterprise),
            _ => Err(format!("Invalid subscription plan: {s}")),
        }
    }
}

// 组织（租户）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "organization.ts")]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub subdomain: String,
    pub education_level: Option<String>,
    pub subscription_plan: SubscriptionPlan,
    pub credits_remaining: i64,
    pub credits_per_period: i64,
    pub renewal_date: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
