//! 上传文件的二进制存储

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::{GraderError, Result};

#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, name: &str, data: &[u8]) -> Result<()>;
    async fn get(&self, name: &str) -> Result<Vec<u8>>;
    async fn remove(&self, name: &str) -> Result<()>;
}

/// 本地目录存储
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_of(&self, name: &str) -> Result<PathBuf> {
        // 存储名由服务端生成，仍拒绝任何路径分隔
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(GraderError::file_operation(format!("非法存储名: {name}")));
        }
        Ok(self.root.join(name))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.path_of(name)?;
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            GraderError::file_operation(format!("创建上传目录失败: {e}"))
        })?;
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| GraderError::file_operation(format!("写入文件失败: {e}")))
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_of(name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(GraderError::file_not_found(format!("文件 {name} 不存在")))
            }
            Err(e) => Err(GraderError::file_operation(format!("读取文件失败: {e}"))),
        }
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_of(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GraderError::file_operation(format!("删除文件失败: {e}"))),
        }
    }
}

pub fn create_blob_store() -> Arc<dyn BlobStore> {
    Arc::new(LocalBlobStore::new(&AppConfig::get().upload.dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> LocalBlobStore {
        let dir = std::env::temp_dir().join(format!("aigrader-blob-{}", uuid::Uuid::new_v4()));
        LocalBlobStore::new(dir)
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let store = temp_store();
        store.put("a.bin", b"%PDF-1.4").await.unwrap();
        assert_eq!(store.get("a.bin").await.unwrap(), b"%PDF-1.4");

        store.remove("a.bin").await.unwrap();
        let err = store.get("a.bin").await.unwrap_err();
        assert!(matches!(err, GraderError::FileNotFound(_)));
        // 重复删除不报错
        store.remove("a.bin").await.unwrap();

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let store = temp_store();
        assert!(store.put("../escape", b"x").await.is_err());
        assert!(store.get("nested/file").await.is_err());
    }
}
