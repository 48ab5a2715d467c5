//! 可观测性：tracing 日志初始化（默认 info，RUST_LOG 可覆盖）

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 安装全局 subscriber；重复调用时忽略
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}
