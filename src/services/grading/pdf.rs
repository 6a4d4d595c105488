use crate::errors::{GraderError, Result};
use crate::utils::is_pdf;

/// 统计 PDF 页数
pub fn count_pages(data: &[u8]) -> Result<usize> {
    if !is_pdf(data) {
        return Err(GraderError::pdf_invalid("File is not a PDF document"));
    }
    let document = lopdf::Document::load_mem(data)
        .map_err(|e| GraderError::pdf_invalid(format!("Failed to parse PDF: {e}")))?;
    Ok(document.get_pages().len())
}

/// 评分消耗：每页 1 积分，至少 1
pub fn grading_cost(page_count: usize) -> i64 {
    (page_count as i64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_pdf;

    #[test]
    fn test_count_pages() {
        assert_eq!(count_pages(&build_pdf(1)).unwrap(), 1);
        assert_eq!(count_pages(&build_pdf(12)).unwrap(), 12);
    }

    #[test]
    fn test_rejects_garbage() {
        let err = count_pages(b"hello world").unwrap_err();
        assert!(matches!(err, GraderError::PdfInvalid(_)));

        let err = count_pages(b"%PDF-1.4 truncated").unwrap_err();
        assert!(matches!(err, GraderError::PdfInvalid(_)));
    }

    #[test]
    fn test_cost_has_floor() {
        assert_eq!(grading_cost(0), 1);
        assert_eq!(grading_cost(3), 3);
    }
}
