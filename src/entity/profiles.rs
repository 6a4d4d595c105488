//! 用户资料实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub organization_id: Option<i64>,
    pub full_name: String,
    pub role: String,
    pub monthly_credit_limit: i64,
    pub monthly_credits_used: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id"
    )]
    Organization,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_profile(self) -> crate::models::users::entities::UserProfile {
        use crate::models::users::entities::{UserProfile, UserRole};

        UserProfile {
            full_name: self.full_name,
            organization_id: self.organization_id,
            role: self.role.parse::<UserRole>().unwrap_or(UserRole::Teacher),
            monthly_credit_limit: self.monthly_credit_limit,
            monthly_credits_used: self.monthly_credits_used,
        }
    }
}
