//! Leadflow 诊断服务：启动 HTTP 接口查看会话阶段状态
//!
//! 端口优先读 LEADFLOW_ADMIN_PORT，默认 3080。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use leadflow::{admin, config::load_config, observability, SessionRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    let registry = Arc::new(SessionRegistry::from_config(&cfg).context("Invalid phase table")?);

    // 定期清理空闲会话
    let cleanup_registry = Arc::clone(&registry);
    let timeout = Duration::from_secs(cfg.intake.session_timeout_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        interval.tick().await;
        loop {
            interval.tick().await;
            cleanup_registry.cleanup_expired(timeout).await;
        }
    });

    let port = std::env::var("LEADFLOW_ADMIN_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3080);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Leadflow admin: http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, admin::router(registry)).await?;

    Ok(())
}
