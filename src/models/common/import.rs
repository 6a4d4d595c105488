use serde::Serialize;
use ts_rs::TS;

/// CSV 导入中单行的错误
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "import.ts")]
pub struct ImportRowError {
    /// 行号（不含表头，从 1 开始）
    pub row: usize,
    pub field: Option<String>,
    pub message: String,
}

/// CSV 导入结果
///
/// 始终满足 `created + skipped + failed == total`。
#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "import.ts")]
pub struct ImportSummary {
    pub total: usize,
    pub created: usize,
    /// 校验不通过或重复的行
    pub skipped: usize,
    /// 写入数据库失败的行
    pub failed: usize,
    pub errors: Vec<ImportRowError>,
}

impl ImportSummary {
    pub fn skip(&mut self, row: usize, field: Option<&str>, message: impl Into<String>) {
        self.skipped += 1;
        self.errors.push(ImportRowError {
            row,
            field: field.map(str::to_string),
            message: message.into(),
        });
    }

    pub fn fail(&mut self, row: usize, message: impl Into<String>) {
        self.failed += 1;
        self.errors.push(ImportRowError {
            row,
            field: None,
            message: message.into(),
        });
    }
}
