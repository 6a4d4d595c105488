use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheResult<T> {
    Found(T),
    NotFound,
    /// 后端出错，无法判断是否存在
    ExistsButNoValue,
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;
    /// ttl 为 0 时使用默认 TTL（秒）
    async fn insert_raw(&self, key: String, value: String, ttl: u64);
    async fn remove(&self, key: &str);
}

impl dyn ObjectCache {
    /// 读取并反序列化，格式错误的条目会被移除
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get_raw(key).await {
            CacheResult::Found(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!("Dropping malformed cache entry '{}': {}", key, e);
                    self.remove(key).await;
                    None
                }
            },
            _ => None,
        }
    }

    pub async fn insert_json<T: Serialize>(&self, key: &str, value: &T, ttl: u64) {
        match serde_json::to_string(value) {
            Ok(raw) => self.insert_raw(key.to_string(), raw, ttl).await,
            Err(e) => debug!("Skipping cache insert for '{}': {}", key, e),
        }
    }
}
