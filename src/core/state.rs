//! UI 投影状态
//!
//! 前端只拿到轻量的 UiState（阶段、进度、工具开关、历史）；完整状态由 ConversationStore 持有。

use serde::Serialize;

use crate::memory::Message;

#[derive(Clone, Debug, Serialize)]
pub struct UiState {
    pub conversation_id: String,
    pub phase: String,
    pub percentage: i32,
    /// 有新工具解锁后置为 true，会话重置前不会回落
    pub tools_enabled: bool,
    pub active_tools: Vec<String>,
    pub history: Vec<Message>,
}
