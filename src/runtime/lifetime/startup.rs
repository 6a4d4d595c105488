use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::errors::{GraderError, Result};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::NewUser;
use crate::services::credits::spawn_renewal_task;
use crate::services::grading::{GeminiClient, GradingModel};
use crate::storage::{BlobStore, Storage, create_blob_store};
use crate::utils::password::hash_password;
use crate::utils::random_code::generate_password;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub blobs: Arc<dyn BlobStore>,
    pub model: Arc<dyn GradingModel>,
    pub renewal_task: JoinHandle<()>,
}

async fn build_cache(name: &str) -> Option<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name)?;
    match constructor().await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", name);
            Some(Arc::from(cache))
        }
        Err(e) => {
            warn!("Failed to create {} cache: {}", name, e);
            None
        }
    }
}

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    let cache_type = &AppConfig::get().cache.cache_type;
    warn!("Attempting to create {} cache backend", cache_type);

    if let Some(cache) = build_cache(cache_type).await {
        return Ok(cache);
    }
    if cache_type != "moka" {
        warn!("Falling back to memory cache");
        if let Some(cache) = build_cache("moka").await {
            return Ok(cache);
        }
    }

    Err(GraderError::cache_plugin_not_found(format!(
        "No cache backend available (tried: {cache_type})"
    )))
}

/// 初始化超级管理员账号
/// 如果数据库中没有任何用户，则按 bootstrap 配置创建
async fn seed_superadmin(storage: &Arc<dyn Storage>) {
    match storage.count_users().await {
        Ok(count) if count > 0 => {
            debug!(
                "Database already has {} user(s), skipping superadmin seed",
                count
            );
            return;
        }
        Ok(_) => {
            info!("No users found in database, creating superadmin account...");
        }
        Err(e) => {
            warn!("Failed to count users: {}, skipping superadmin seed", e);
            return;
        }
    }

    let bootstrap = &AppConfig::get().bootstrap;
    let password = if bootstrap.admin_password.trim().is_empty() {
        let generated = generate_password(16);
        warn!("==========================================================");
        warn!("  SUPERADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated password: {}", generated);
        warn!("  Please save this password or set ADMIN_PASSWORD env var");
        warn!("==========================================================");
        generated
    } else {
        bootstrap.admin_password.clone()
    };

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash superadmin password: {}, skipping seed", e);
            return;
        }
    };

    let superadmin = NewUser {
        email: bootstrap.admin_email.trim().to_lowercase(),
        password_hash,
        full_name: bootstrap.admin_name.clone(),
        role: UserRole::Superadmin,
        organization_id: None,
        monthly_credit_limit: 0,
    };

    match storage.create_user(superadmin).await {
        Ok(user) => info!(
            "Superadmin account created successfully (ID: {}, email: {})",
            user.id, user.email
        ),
        Err(e) => warn!("Failed to create superadmin account: {}", e),
    }
}

/// 准备服务器启动的上下文
/// 包括存储、缓存、文件存储、评分模型与积分续期任务
pub async fn prepare_server_startup() -> Result<StartupContext> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| GraderError::configuration("Failed to install rustls crypto provider"))?;

    if cfg!(debug_assertions) {
        debug!(
            "Registered cache backends: {:?}",
            crate::cache::register::registered_object_cache_plugins()
        );
    }

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    seed_superadmin(&storage).await;

    let cache = create_cache().await?;
    warn!("Cache backend initialized");

    let config = AppConfig::get();
    let blobs = create_blob_store();
    let model: Arc<dyn GradingModel> = Arc::new(GeminiClient::new(&config.ai)?);
    info!(
        "Grading model {} configured, uploads stored in {}",
        config.ai.model, config.upload.dir
    );

    let renewal_task = spawn_renewal_task(storage.clone());

    Ok(StartupContext {
        storage,
        cache,
        blobs,
        model,
        renewal_task,
    })
}
