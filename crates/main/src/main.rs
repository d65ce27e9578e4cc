//! 主应用程序入口
//!
//! 加载配置，组装会话核心并启动 Axum 服务。

use anyhow::Context;
use application::SessionSettings;
use config::AppConfig;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    // RUST_LOG 优先，其次使用配置文件中的过滤规则
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let state = AppState::in_memory(SessionSettings::from(&config));
    let app = router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(
        address = %address,
        default_page_size = config.history.default_page_size,
        max_page_size = config.history.max_page_size,
        "聊天室服务器启动"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("服务器已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("收到关闭信号，开始优雅停机");
}
