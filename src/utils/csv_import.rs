//! CSV 导入解析

use std::collections::HashMap;
use std::io::Cursor;

use crate::models::ErrorCode;

/// 单次导入的最大行数
pub const MAX_IMPORT_ROWS: usize = 1000;

/// 导入解析错误（整份文件被拒绝）
#[derive(Debug)]
pub enum ImportParseError {
    MissingColumn(String),
    ParseFailed(String),
    EmptyFile,
    TooManyRows(usize),
}

impl ImportParseError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingColumn(_) => ErrorCode::ImportFileMissingColumn,
            Self::ParseFailed(_) => ErrorCode::ImportFileParseFailed,
            Self::EmptyFile => ErrorCode::ImportFileDataInvalid,
            Self::TooManyRows(_) => ErrorCode::ImportTooManyRows,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::MissingColumn(col) => format!("Missing required column: {col}"),
            Self::ParseFailed(msg) => msg.clone(),
            Self::EmptyFile => "The file contains no data rows".to_string(),
            Self::TooManyRows(max) => format!("At most {max} rows can be imported at once"),
        }
    }
}

/// 一行数据，按列名取值（已去除首尾空白）
#[derive(Debug, Clone)]
pub struct CsvRow {
    /// 行号（不含表头，从 1 开始）
    pub row: usize,
    values: HashMap<String, String>,
}

impl CsvRow {
    pub fn get(&self, column: &str) -> &str {
        self.values.get(column).map(String::as_str).unwrap_or("")
    }

    /// 空值视为 None
    pub fn optional(&self, column: &str) -> Option<String> {
        Some(self.get(column))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

/// 解析带表头的 CSV，表头大小写不敏感
///
/// `columns` 中的列必须全部存在，`optional` 中的列可缺省。
pub fn parse_csv(
    data: &[u8],
    columns: &[&str],
    optional: &[&str],
) -> Result<Vec<CsvRow>, ImportParseError> {
    // 去掉 UTF-8 BOM
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(data));

    let headers = reader
        .headers()
        .map_err(|e| ImportParseError::ParseFailed(format!("Failed to read header: {e}")))?;
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect();

    let mut indexes = Vec::with_capacity(columns.len() + optional.len());
    for column in columns {
        let idx = header_map
            .get(*column)
            .ok_or_else(|| ImportParseError::MissingColumn(column.to_string()))?;
        indexes.push((column.to_string(), *idx));
    }
    for column in optional {
        if let Some(idx) = header_map.get(*column) {
            indexes.push((column.to_string(), *idx));
        }
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            ImportParseError::ParseFailed(format!("Failed to parse row {}: {e}", i + 1))
        })?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if rows.len() == MAX_IMPORT_ROWS {
            return Err(ImportParseError::TooManyRows(MAX_IMPORT_ROWS));
        }
        let values = indexes
            .iter()
            .map(|(column, idx)| {
                let value = record.get(*idx).unwrap_or("").trim().to_string();
                (column.clone(), value)
            })
            .collect();
        rows.push(CsvRow { row: i + 1, values });
    }

    if rows.is_empty() {
        return Err(ImportParseError::EmptyFile);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_bom_and_mixed_case_headers() {
        let data = "\u{FEFF}Full_Name,Student_Email,tutor_email\nAna, ana@x.test ,\nLuis,luis@x.test,padre@x.test\n";
        let rows = parse_csv(
            data.as_bytes(),
            &["full_name", "student_email", "tutor_email"],
            &[],
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 1);
        assert_eq!(rows[0].get("student_email"), "ana@x.test");
        assert_eq!(rows[0].optional("tutor_email"), None);
        assert_eq!(rows[1].optional("tutor_email").as_deref(), Some("padre@x.test"));
    }

    #[test]
    fn test_missing_column() {
        let err = parse_csv(b"full_name,email\nAna,a@x.test\n", &["full_name", "student_email"], &[])
            .unwrap_err();
        assert!(matches!(err, ImportParseError::MissingColumn(ref c) if c == "student_email"));
        assert_eq!(err.error_code(), ErrorCode::ImportFileMissingColumn);
    }

    #[test]
    fn test_optional_column_and_blank_lines() {
        let data = b"name,subdomain\nSchool A,school-a\n,\n";
        let rows = parse_csv(data, &["name", "subdomain"], &["education_level"]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].optional("education_level"), None);
    }

    #[test]
    fn test_empty_file() {
        let err = parse_csv(b"name,subdomain\n", &["name", "subdomain"], &[]).unwrap_err();
        assert!(matches!(err, ImportParseError::EmptyFile));
    }

    #[test]
    fn test_too_many_rows() {
        let mut data = String::from("full_name\n");
        for i in 0..=MAX_IMPORT_ROWS {
            data.push_str(&format!("Student {i}\n"));
        }
        let err = parse_csv(data.as_bytes(), &["full_name"], &[]).unwrap_err();
        assert!(matches!(err, ImportParseError::TooManyRows(MAX_IMPORT_ROWS)));
    }
}
