//! 积分服务入口
//!
//! 提供交易入账、余额查询、奖励兑换和活动管理的 REST API。

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::http::HeaderValue;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use loyalty_service::{AppState, MemoryStore, Repositories, routes, service::StoreAccess};
use loyalty_shared::{
    config::{AppConfig, StorageBackend},
    database::Database,
    observability,
};

const SERVICE_NAME: &str = "loyalty-service";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载配置
    let config = AppConfig::load(SERVICE_NAME)?;

    // 2. 初始化日志与指标
    let _guard = observability::init(&config.service_name, &config.observability).await?;

    info!("Starting {} on {}", SERVICE_NAME, config.server_addr());
    info!(
        environment = %config.environment,
        backend = ?config.storage.backend,
        "Configuration loaded"
    );

    // 3. 创建仓储（数据库连接随仓储一起持有）
    let (repos, database) = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = Database::connect(&config.database).await?;
            db.health_check().await?;
            if config.database.run_migrations {
                db.run_migrations(Path::new("migrations")).await?;
            }
            info!("Database connection established");
            (Repositories::postgres(db.pool().clone()), Some(db))
        }
        StorageBackend::Memory => {
            if config.is_production() {
                warn!("生产环境使用进程内存储，数据将在重启后丢失");
            }
            (Repositories::memory(Arc::new(MemoryStore::new())), None)
        }
    };
    info!("Repositories initialized");

    // 4. 创建服务
    let state = AppState::new(repos, StoreAccess::from_config(&config.storage));
    info!("Services initialized");

    // 5. 启动 HTTP 服务
    let app = routes::app(
        state,
        Duration::from_secs(config.server.request_timeout_seconds),
    )
    .layer(cors_layer());

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = database {
        db.close().await;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// CORS 配置：通过 LOYALTY_CORS_ORIGINS 环境变量控制允许的来源
fn cors_layer() -> CorsLayer {
    let allowed_origins =
        std::env::var("LOYALTY_CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    if allowed_origins == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    info!("CORS allowed_origins: {}", allowed_origins);
    let origins: Vec<_> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// 优雅关闭信号处理
///
/// 监听 Ctrl+C 和 SIGTERM 信号
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
