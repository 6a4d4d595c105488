use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "file.ts")]
pub struct FileUploadResponse {
    /// 文件令牌，用于提交与考试答案引用
    pub download_token: String,
    /// 原始文件名
    pub file_name: String,
    /// 文件大小(字节)
    pub size: i64,
    /// 文件类型
    pub content_type: String,
    /// PDF 页数
    pub page_count: usize,
    /// 上传时间
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}
