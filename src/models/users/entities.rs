use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 用户角色
#[derive(Debug, Clone, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "user.ts")]
pub enum UserRole {
    Teacher,              // 教师
    Admin,                // 学校管理员
    Director,             // 校长
    Superadmin,           // 平台超级管理员
    InstitutionalManager, // 机构（教育局）管理者，只读统计
}

impl UserRole {
    pub const TEACHER: &'static str = "teacher";
    pub const ADMIN: &'static str = "admin";
    pub const DIRECTOR: &'static str = "director";
    pub const SUPERADMIN: &'static str = "superadmin";
    pub const INSTITUTIONAL_MANAGER: &'static str = "institutional_manager";

    pub fn superadmin_roles() -> &'static [&'static UserRole] {
        &[&Self::Superadmin]
    }
    /// 可以管理本组织用户的角色
    pub fn manager_roles() -> &'static [&'static UserRole] {
        &[&Self::Admin, &Self::Director, &Self::Superadmin]
    }
    /// 可以管理班级、学生、考试的角色
    pub fn staff_roles() -> &'static [&'static UserRole] {
        &[&Self::Teacher, &Self::Admin, &Self::Director, &Self::Superadmin]
    }
    pub fn institutional_roles() -> &'static [&'static UserRole] {
        &[&Self::Superadmin, &Self::InstitutionalManager]
    }
    pub fn all_roles() -> &'static [&'static UserRole] {
        &[
            &Self::Teacher,
            &Self::Admin,
            &Self::Director,
            &Self::Superadmin,
            &Self::InstitutionalManager,
        ]
    }

    /// 组织内管理员（admin / director）
    pub fn is_org_manager(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Director)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Teacher => Self::TEACHER,
            UserRole::Admin => Self::ADMIN,
            UserRole::Director => Self::DIRECTOR,
            UserRole::Superadmin => Self::SUPERADMIN,
            UserRole::InstitutionalManager => Self::INSTITUTIONAL_MANAGER,
        }
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的用户角色: '{s}'. 支持的角色: teacher, admin, director, superadmin, institutional_manager"
            ))
        })
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            UserRole::TEACHER => Ok(UserRole::Teacher),
            UserRole::ADMIN => Ok(UserRole::Admin),
            UserRole::DIRECTOR => Ok(UserRole::Director),
            UserRole::SUPERADMIN => Ok(UserRole::Superadmin),
            UserRole::INSTITUTIONAL_MANAGER => Ok(UserRole::InstitutionalManager),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

// 用户状态
#[derive(Debug, Clone, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "user.ts")]
pub enum UserStatus {
    Active,    // 活跃
    Inactive,  // 非活跃
    Suspended, // 暂停
}

impl<'de> Deserialize<'de> for UserStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的用户状态: '{s}'. 支持的状态: active, inactive, suspended"
            ))
        })
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Inactive => write!(f, "inactive"),
            UserStatus::Suspended => write!(f, "suspended"),
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            "suspended" => Ok(UserStatus::Suspended),
            _ => Err(format!("Invalid user status: {s}")),
        }
    }
}

// 用户资料（profiles 表）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserProfile {
    pub full_name: String,
    pub organization_id: Option<i64>,
    pub role: UserRole,
    pub monthly_credit_limit: i64,
    pub monthly_credits_used: i64,
}

// 用户实体：认证身份 + 资料
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    #[ts(skip)]
    pub password_hash: String,
    pub status: UserStatus,
    pub profile: UserProfile,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn role(&self) -> &UserRole {
        &self.profile.role
    }

    pub fn organization_id(&self) -> Option<i64> {
        self.profile.organization_id
    }

    pub fn is_superadmin(&self) -> bool {
        self.profile.role == UserRole::Superadmin
    }

    /// 是否为指定组织的管理员（admin / director）
    pub fn manages_organization(&self, organization_id: i64) -> bool {
        self.profile.role.is_org_manager() && self.profile.organization_id == Some(organization_id)
    }

    // 生成 token 对（access + refresh）
    pub fn generate_token_pair(
        &self,
        refresh_token_expiry: Option<chrono::TimeDelta>,
    ) -> crate::errors::Result<crate::utils::jwt::TokenPair> {
        crate::utils::jwt::JwtUtils::generate_token_pair(
            self.id,
            self.profile.role.as_str(),
            refresh_token_expiry,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_str() {
        for role in UserRole::all_roles() {
            let parsed: UserRole = role.as_str().parse().unwrap();
            assert_eq!(&parsed, *role);
        }
        assert!("student".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_deserialize_error_message() {
        let err = serde_json::from_str::<UserRole>("\"owner\"").unwrap_err();
        assert!(err.to_string().contains("无效的用户角色"));
        let role: UserRole = serde_json::from_str("\"institutional_manager\"").unwrap();
        assert_eq!(role, UserRole::InstitutionalManager);
    }

    #[test]
    fn test_org_manager_roles() {
        assert!(UserRole::Admin.is_org_manager());
        assert!(UserRole::Director.is_org_manager());
        assert!(!UserRole::Teacher.is_org_manager());
        assert!(!UserRole::Superadmin.is_org_manager());
    }
}
