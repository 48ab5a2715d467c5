//! 带阶段门控的工具执行器
//!
//! 只有当前会话已解锁的 token 才能执行；执行时加超时，失败统一转为 IntakeError，
//! 每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::config::AppConfig;
use crate::core::IntakeError;
use crate::phase::PhaseToolsManager;
use crate::tools::ToolRegistry;

pub struct GatedExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

impl GatedExecutor {
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 超时取自 `[tools] tool_timeout_secs`
    pub fn from_config(cfg: &AppConfig, registry: ToolRegistry) -> Self {
        Self::new(registry, cfg.tools.tool_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// 未注册 -> UnknownTool；未解锁 -> ToolLocked；超时 -> ToolTimeout；工具返回 Err -> ToolFailed
    pub async fn execute(
        &self,
        manager: &PhaseToolsManager,
        tool_name: &str,
        args: serde_json::Value,
    ) -> Result<String, IntakeError> {
        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| IntakeError::UnknownTool(tool_name.to_string()))?;
        if !manager.is_tool_active(tool_name) {
            tracing::warn!(
                tool = tool_name,
                phase = manager.current_phase(),
                "tool invoked before unlock"
            );
            return Err(IntakeError::ToolLocked(tool_name.to_string()));
        }

        let start = Instant::now();
        let args_preview = args_preview(&args);
        let result = timeout(self.timeout, tool.execute(args)).await;

        let (ok, outcome): (bool, &str) = match &result {
            Ok(Ok(_)) => (true, "ok"),
            Ok(Err(_)) => (false, "error"),
            Err(_) => (false, "timeout"),
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "phase": manager.current_phase(),
            "ok": ok,
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit, "tool");

        match result {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(e)) => Err(IntakeError::ToolFailed(e)),
            Err(_) => Err(IntakeError::ToolTimeout(tool_name.to_string())),
        }
    }
}

fn args_preview(args: &serde_json::Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
