//! 组织实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub subdomain: String,
    pub education_level: Option<String>,
    pub subscription_plan: String,
    pub credits_remaining: i64,
    pub credits_per_period: i64,
    pub renewal_date: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::profiles::Entity")]
    Profiles,
    #[sea_orm(has_many = "super::classes::Entity")]
    Classes,
    #[sea_orm(has_many = "super::credit_transactions::Entity")]
    CreditTransactions,
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profiles.def()
    }
}

impl Related<super::classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classes.def()
    }
}

impl Related<super::credit_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_organization(self) -> crate::models::organizations::entities::Organization {
        use crate::models::organizations::entities::{Organization, SubscriptionPlan};

        Organization {
            id: self.id,
            name: self.name,
            subdomain: self.subdomain,
            education_level: self.education_level,
            subscription_plan: self
                .subscription_plan
                .parse::<SubscriptionPlan>()
                .unwrap_or(SubscriptionPlan::Free),
            credits_remaining: self.credits_remaining,
            credits_per_period: self.credits_per_period,
            renewal_date: super::to_datetime(self.renewal_date),
            created_at: super::to_datetime(self.created_at),
            updated_at: super::to_datetime(self.updated_at),
        }
    }
}
