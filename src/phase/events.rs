//! 阶段事件：管理器状态变化时向外广播（日志、UI 通道），核心逻辑不直接依赖控制台输出

use serde::Serialize;
use tokio::sync::mpsc;

/// 阶段管理器产生的事件（可序列化为 JSON 供前端展示）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PhaseEvent {
    /// 当前阶段指针移动（包括百分比回退）
    PhaseChanged {
        from_phase: String,
        from_percentage: i32,
        to_phase: String,
        to_percentage: i32,
    },
    /// 本次新解锁的工具（非空时才发出）
    ToolsActivated {
        phase: String,
        percentage: i32,
        tools: Vec<String>,
    },
    /// 管理器被重置
    Reset,
}

/// 事件接收端
pub trait PhaseEventSink: Send + Sync {
    fn emit(&self, event: &PhaseEvent);
}

/// 丢弃所有事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl PhaseEventSink for NoopSink {
    fn emit(&self, _event: &PhaseEvent) {}
}

/// 以结构化 tracing 日志输出事件
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl PhaseEventSink for TracingSink {
    fn emit(&self, event: &PhaseEvent) {
        match event {
            PhaseEvent::PhaseChanged {
                from_phase,
                from_percentage,
                to_phase,
                to_percentage,
            } => {
                tracing::debug!(
                    from = %from_phase,
                    from_percentage,
                    to = %to_phase,
                    to_percentage,
                    "phase changed"
                );
            }
            PhaseEvent::ToolsActivated {
                phase,
                percentage,
                tools,
            } => {
                tracing::info!(phase = %phase, percentage, tools = ?tools, "tools activated");
            }
            PhaseEvent::Reset => {
                tracing::info!("phase tools reset");
            }
        }
    }
}

/// 转发到 tokio 通道（UI 订阅「工具已启用」等状态）；接收端关闭后静默丢弃
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<PhaseEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PhaseEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PhaseEventSink for ChannelSink {
    fn emit(&self, event: &PhaseEvent) {
        let _ = self.tx.send(event.clone());
    }
}
