use std::future::Future;
use std::sync::Arc;

use axum::Router;
use configs::{AppConfig, ServerConfig, StoreBackend, StoreConfig};
use service::storage::{memory_store::MemoryStore, redis_store::RedisStore, UserStore};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::routes;
use crate::state::AppState;

/// Open the configured store. Fails when Redis cannot be reached.
pub async fn connect_store(cfg: &StoreConfig) -> anyhow::Result<Arc<dyn UserStore>> {
    match cfg.backend {
        StoreBackend::Memory => {
            warn!(event = "store_memory", "using in-memory store; records are lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Redis => {
            info!(event = "store_connecting", tls = cfg.tls, "connecting to redis");
            let store = RedisStore::connect(&cfg.connection_url(), cfg.password.as_deref(), cfg.command_timeout())
                .await
                .map_err(|e| anyhow::anyhow!("failed to connect with redis instance: {e}"))?;
            Ok(Arc::new(store))
        }
    }
}

pub fn build_app(store: Arc<dyn UserStore>, server: &ServerConfig) -> Router {
    routes::build_router(AppState::new(store), server.max_body_bytes)
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    // 同时监听 Ctrl+C 与 SIGTERM（容器停止时发送），任一到达即开始停机
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!(event = "shutdown_signal", "shutdown signal received, draining requests");
}

/// Connect the configured store, bind, and serve until SIGINT/SIGTERM.
pub async fn run_with_config(cfg: AppConfig) -> anyhow::Result<()> {
    let addr = cfg.server.bind_addr()?;
    let store = connect_store(&cfg.store).await?;

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            // 端口绑定失败时同样需要释放已建立的存储连接
            if let Err(close_err) = store.close().await {
                warn!(error = %close_err, "failed to close store");
            }
            return Err(e.into());
        }
    };
    info!(%addr, "listening; press ctrl+c to shut down");

    serve(listener, store, &cfg.server, shutdown_signal()).await
}

/// Serve on `listener` until `shutdown` resolves, let in-flight requests
/// finish, then close `store` exactly once.
pub async fn serve<F>(
    listener: TcpListener,
    store: Arc<dyn UserStore>,
    server: &ServerConfig,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_app(Arc::clone(&store), server);

    // 优雅停机：收到信号后停止接收新连接，等待已有请求处理完毕
    let served = axum::serve(listener, app).with_graceful_shutdown(shutdown).await;

    // 无论服务是否正常退出，都只关闭一次存储连接
    if let Err(e) = store.close().await {
        warn!(error = %e, "failed to close store");
    }
    served?;
    info!(event = "stopped", "application stopped");
    Ok(())
}
