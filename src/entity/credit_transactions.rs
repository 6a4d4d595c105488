//! 积分流水实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "credit_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub organization_id: i64,
    pub user_id: Option<i64>,
    pub submission_id: Option<i64>,
    pub kind: String,
    pub amount: i64,
    pub balance_after: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id"
    )]
    Organization,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_credit_transaction(self) -> crate::models::credits::entities::CreditTransaction {
        use crate::models::credits::entities::{CreditTransaction, CreditTransactionKind};

        CreditTransaction {
            id: self.id,
            organization_id: self.organization_id,
            user_id: self.user_id,
            submission_id: self.submission_id,
            kind: self
                .kind
                .parse::<CreditTransactionKind>()
                .unwrap_or(CreditTransactionKind::Adjustment),
            amount: self.amount,
            balance_after: self.balance_after,
            description: self.description,
            created_at: super::to_datetime(self.created_at),
        }
    }
}
