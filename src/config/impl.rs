use config::{Config, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    /// 加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // 首先加载默认配置文件
            .add_source(File::with_name("config").required(false))
            // 然后根据环境加载特定配置文件
            .add_source(
                File::with_name(&format!(
                    "config.{}",
                    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // 最后加载环境变量覆盖
            .add_source(
                Environment::with_prefix("AIGRADER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        // 常用环境变量
        builder = builder
            .set_override_option("app.environment", std::env::var("APP_ENV").ok())?
            .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
            .set_override_option("app.public_url", std::env::var("PUBLIC_URL").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("server.unix_socket_path", std::env::var("UNIX_SOCKET").ok())?
            .set_override_option("server.workers", std::env::var("CPU_COUNT").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("cache.redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option(
                "cache.redis.key_prefix",
                std::env::var("REDIS_KEY_PREFIX").ok(),
            )?
            .set_override_option("ai.api_key", std::env::var("GEMINI_API_KEY").ok())?
            .set_override_option("ai.model", std::env::var("GEMINI_MODEL").ok())?
            .set_override_option("email.api_key", std::env::var("EMAIL_API_KEY").ok())?
            .set_override_option("email.from", std::env::var("EMAIL_FROM").ok())?
            .set_override_option(
                "bootstrap.admin_password",
                std::env::var("ADMIN_PASSWORD").ok(),
            )?;

        let config = builder.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;

        // 处理工作线程数
        if app_config.server.workers == 0 {
            app_config.server.workers = num_cpus::get().min(app_config.server.max_workers);
        }

        Ok(app_config)
    }

    /// 启动时校验，缺少关键配置直接失败
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "jwt.secret is required (set JWT_SECRET)".to_string(),
            ));
        }
        if self.ai.api_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "ai.api_key is required (set GEMINI_API_KEY)".to_string(),
            ));
        }
        if self.credits.period_days <= 0 {
            return Err(ConfigError::Message(
                "credits.period_days must be positive".to_string(),
            ));
        }
        if self.credits.default_per_period < 0 || self.credits.default_monthly_limit < 0 {
            return Err(ConfigError::Message(
                "credit defaults must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 初始化配置 (在应用启动时调用)
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))?;
        Ok(())
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    /// 获取服务器绑定地址
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取 Unix 套接字路径 (如果配置了)
    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        if self.server.unix_socket_path.is_empty() {
            None
        } else {
            Some(&self.server.unix_socket_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn load_from(toml: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("config should deserialize")
    }

    #[test]
    fn test_default_file_deserializes() {
        let config = load_from(include_str!("../../config.toml"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.credits.period_days, 30);
        assert!(config.email.api_key.is_empty());
    }

    #[test]
    fn test_validate_requires_secrets() {
        let mut config = load_from(include_str!("../../config.toml"));
        assert!(config.validate().is_err());

        config.jwt.secret = "secret".to_string();
        assert!(config.validate().is_err());

        config.ai.api_key = "key".to_string();
        assert!(config.validate().is_ok());

        config.credits.period_days = 0;
        assert!(config.validate().is_err());
    }
}
