//! multipart 上传读取

use actix_multipart::Multipart;
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;

use crate::models::ErrorCode;

/// 上传的单个文件
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// 小写扩展名（含点），没有扩展名时为空串
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default()
    }
}

#[derive(Debug)]
pub enum UploadError {
    Missing,
    Multiple,
    TooLarge(usize),
    Stream(String),
}

impl UploadError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Missing => ErrorCode::FileNotFound,
            Self::Multiple => ErrorCode::MultifileUploadNotAllowed,
            Self::TooLarge(_) => ErrorCode::FileSizeExceeded,
            Self::Stream(_) => ErrorCode::FileUploadFailed,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Missing => "No file found in upload payload".to_string(),
            Self::Multiple => "Only one file can be uploaded at a time".to_string(),
            Self::TooLarge(limit) => format!("File size exceeds the limit of {limit} bytes"),
            Self::Stream(msg) => format!("Failed to read upload: {msg}"),
        }
    }
}

/// 读取名为 `file` 的字段，超过 max_size 立即中止
pub async fn read_single_file(
    payload: &mut Multipart,
    max_size: usize,
) -> Result<UploadedFile, UploadError> {
    let mut uploaded: Option<UploadedFile> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| UploadError::Stream(e.to_string()))?
    {
        let content_disposition = field.content_disposition();
        let name = content_disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        if name != "file" {
            continue;
        }
        if uploaded.is_some() {
            return Err(UploadError::Multiple);
        }

        let file_name = content_disposition
            .and_then(|cd| cd.get_filename())
            .map(str::to_string)
            .unwrap_or_default();
        let content_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .unwrap_or_default();

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| UploadError::Stream(e.to_string()))?;
            if data.len() + chunk.len() > max_size {
                return Err(UploadError::TooLarge(max_size));
            }
            data.extend_from_slice(&chunk);
        }

        uploaded = Some(UploadedFile {
            file_name,
            content_type,
            data,
        });
    }

    match uploaded {
        Some(file) if !file.data.is_empty() => Ok(file),
        _ => Err(UploadError::Missing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_lowercased() {
        let file = UploadedFile {
            file_name: "Examen Final.PDF".to_string(),
            content_type: "application/pdf".to_string(),
            data: vec![1],
        };
        assert_eq!(file.extension(), ".pdf");

        let file = UploadedFile {
            file_name: "noext".to_string(),
            content_type: String::new(),
            data: vec![1],
        };
        assert_eq!(file.extension(), "");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            UploadError::Multiple.error_code(),
            ErrorCode::MultifileUploadNotAllowed
        );
        assert_eq!(
            UploadError::TooLarge(10).error_code(),
            ErrorCode::FileSizeExceeded
        );
        assert!(UploadError::TooLarge(10).message().contains("10 bytes"));
    }
}
