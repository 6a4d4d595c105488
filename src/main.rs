use std::io;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::middleware::{Compress, DefaultHeaders};
use actix_web::{App, HttpServer, http::Method, web};
use dotenv::dotenv;
use human_panic::setup_panic;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;

use ai_grader::config::AppConfig;
use ai_grader::models::AppStartTime;
use ai_grader::routes;
use ai_grader::runtime::lifetime;
use ai_grader::utils::{json_error_handler, query_error_handler};

/// 开发环境输出带文件位置的彩色日志，其余环境输出 JSON
fn init_tracing(config: &AppConfig) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(io::stdout());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.app.log_level))
        .with_writer(writer)
        .event_format(
            tracing_subscriber::fmt::format()
                .with_level(true)
                .with_ansi(true),
        );

    if config.is_development() {
        builder.with_file(true).with_line_number(true).init();
    } else {
        builder.json().init();
    }
    guard
}

/// 按配置构建 CORS；允许列表包含 "*" 时放行任意来源
fn build_cors(config: &AppConfig) -> Cors {
    let cors = &config.cors;
    let mut builder = if cors.allowed_origins.iter().any(|origin| origin == "*") {
        Cors::default().allow_any_origin()
    } else {
        cors.allowed_origins
            .iter()
            .fold(Cors::default(), |builder, origin| {
                builder.allowed_origin(origin)
            })
            .supports_credentials()
    };

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|method| Method::from_bytes(method.as_bytes()).ok())
        .collect();
    builder = if methods.is_empty() {
        builder.allow_any_method()
    } else {
        builder.allowed_methods(methods)
    };

    builder = if cors.allowed_headers.iter().any(|header| header == "*") {
        builder.allow_any_header()
    } else {
        builder.allowed_headers(cors.allowed_headers.iter().map(String::as_str))
    };

    builder.max_age(cors.max_age)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    setup_panic!();
    AppConfig::init()
        .map_err(|e| io::Error::other(format!("Failed to initialize configuration: {e}")))?;
    let config = AppConfig::get();
    let _log_guard = init_tracing(config);

    warn!(
        "Starting {} v{} ({} environment)",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.app.environment
    );

    let startup = lifetime::startup::prepare_server_startup()
        .await
        .map_err(|e| io::Error::other(e.format_simple()))?;

    let storage = startup.storage.clone();
    let cache = startup.cache.clone();
    let blobs = startup.blobs.clone();
    let model = startup.model.clone();

    debug!(
        "Pre-startup processing completed in {} ms",
        chrono::Utc::now()
            .signed_duration_since(app_start_time.start_datetime)
            .num_milliseconds()
    );
    warn!("Using {} worker threads", config.server.workers);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors(config))
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate"))
                    .add(("X-Content-Type-Options", "nosniff")),
            )
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PayloadConfig::new(config.server.limits.max_payload_size))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(blobs.clone()))
            .app_data(web::Data::new(model.clone()))
            .configure(routes::configure_all)
    })
    .keep_alive(Duration::from_secs(config.server.timeouts.keep_alive))
    .client_request_timeout(Duration::from_millis(config.server.timeouts.client_request))
    .client_disconnect_timeout(Duration::from_millis(
        config.server.timeouts.client_disconnect,
    ))
    .workers(config.server.workers);

    #[cfg(unix)]
    let server = match config.unix_socket_path() {
        Some(socket_path) => {
            warn!("Starting server on Unix socket: {}", socket_path);
            if std::path::Path::new(socket_path).exists() {
                std::fs::remove_file(socket_path)?;
            }
            server.bind_uds(socket_path)?
        }
        None => {
            let bind_address = config.server_bind_address();
            warn!("Starting server at http://{}", bind_address);
            server.bind(bind_address)?
        }
    };

    #[cfg(not(unix))]
    let server = {
        let bind_address = config.server_bind_address();
        warn!("Starting server at http://{}", bind_address);
        server.bind(bind_address)?
    };

    tokio::select! {
        res = server.run() => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown() => {
            startup.renewal_task.abort();
            warn!("Graceful shutdown: credit renewal task stopped");
        }
    }

    Ok(())
}
