// 统计范围（用于存储层）
//
// 两个字段都为空时统计全平台
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsScope {
    pub organization_id: Option<i64>,
    pub teacher_id: Option<i64>,
}

impl StatsScope {
    pub fn organization(organization_id: i64) -> Self {
        Self {
            organization_id: Some(organization_id),
            teacher_id: None,
        }
    }

    pub fn teacher(teacher_id: i64) -> Self {
        Self {
            organization_id: None,
            teacher_id: Some(teacher_id),
        }
    }
}

/// 教师本月用量
#[derive(Debug, Clone)]
pub struct TeacherUsageRow {
    pub teacher_id: i64,
    pub full_name: String,
    pub monthly_credits_used: i64,
    pub monthly_credit_limit: i64,
}
