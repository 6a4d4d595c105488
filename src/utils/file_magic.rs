/// 是否为 PDF 文件（以 `%PDF-` 开头）
pub fn is_pdf(data: &[u8]) -> bool {
    data.starts_with(b"%PDF-")
}

/// 验证文件内容的魔术字节是否与扩展名匹配
///
/// 只接受评分流程用到的类型：PDF 与 CSV（CSV 不能含 NUL 字节）。
pub fn validate_magic_bytes(data: &[u8], extension: &str) -> bool {
    if data.is_empty() {
        return false;
    }

    match extension.to_lowercase().as_str() {
        ".pdf" => is_pdf(data),
        ".csv" => !data.contains(&0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_magic() {
        assert!(validate_magic_bytes(b"%PDF-1.7\n", ".pdf"));
        assert!(validate_magic_bytes(b"%PDF-1.4", ".PDF"));
        assert!(!validate_magic_bytes(b"PK\x03\x04", ".pdf"));
    }

    #[test]
    fn test_csv_magic() {
        assert!(validate_magic_bytes(b"full_name,student_email\n", ".csv"));
        assert!(!validate_magic_bytes(b"a,b\x00", ".csv"));
    }

    #[test]
    fn test_empty_or_unknown() {
        assert!(!validate_magic_bytes(&[], ".pdf"));
        assert!(!validate_magic_bytes(b"%PDF-1.4", ".exe"));
    }
}
