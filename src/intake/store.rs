//! 会话状态存储：消息历史 + 已收集信息 + 阶段工具管理器
//!
//! 每次收集到新字段都会重新推导进度并驱动管理器；有新工具解锁时打开 tools_enabled，供 UI 与 Agent 层读取。

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::collected::CollectedInfo;
use crate::core::{IntakeError, UiState};
use crate::memory::{ConversationMemory, Message};
use crate::phase::{NoopSink, PhaseEventSink, PhaseStatus, PhaseTable, PhaseToolsManager};

/// 管理后台查看用的会话摘要
#[derive(Clone, Debug, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
    pub tools_enabled: bool,
    pub collected: CollectedInfo,
    pub status: PhaseStatus,
}

pub struct ConversationStore {
    id: String,
    created_at: DateTime<Utc>,
    last_active: Instant,
    history: ConversationMemory,
    collected: CollectedInfo,
    manager: PhaseToolsManager,
    tools_enabled: bool,
}

impl ConversationStore {
    /// 标准里程碑表、不输出事件
    pub fn new(max_context_turns: usize) -> Self {
        Self::with_parts(max_context_turns, Arc::new(PhaseTable::default()), Arc::new(NoopSink))
    }

    pub fn with_parts(
        max_context_turns: usize,
        table: Arc<PhaseTable>,
        sink: Arc<dyn PhaseEventSink>,
    ) -> Self {
        Self {
            id: new_conversation_id(),
            created_at: Utc::now(),
            last_active: Instant::now(),
            history: ConversationMemory::new(max_context_turns),
            collected: CollectedInfo::default(),
            manager: PhaseToolsManager::with_table(table).with_sink(sink),
            tools_enabled: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    pub fn tools_enabled(&self) -> bool {
        self.tools_enabled
    }

    pub fn collected(&self) -> &CollectedInfo {
        &self.collected
    }

    pub fn manager(&self) -> &PhaseToolsManager {
        &self.manager
    }

    pub fn messages(&self) -> &[Message] {
        self.history.messages()
    }

    pub fn push_message(&mut self, message: Message) {
        self.history.push(message);
        self.last_active = Instant::now();
    }

    pub fn record_country(&mut self, country: &str) -> Result<Vec<String>, IntakeError> {
        self.collected.set_target_country(country)?;
        Ok(self.sync_phase())
    }

    pub fn record_sales_channels(&mut self, channels: &str) -> Result<Vec<String>, IntakeError> {
        self.collected.add_sales_channels(channels)?;
        Ok(self.sync_phase())
    }

    pub fn record_phone(&mut self, phone: &str) -> Result<Vec<String>, IntakeError> {
        self.collected.set_phone(phone)?;
        Ok(self.sync_phase())
    }

    pub fn record_competitors(&mut self, competitors: &str) -> Result<Vec<String>, IntakeError> {
        self.collected.add_competitors(competitors)?;
        Ok(self.sync_phase())
    }

    pub fn request_demo(&mut self) -> Vec<String> {
        self.collected.request_demo();
        self.sync_phase()
    }

    /// 由已收集信息推导 (阶段, 百分比) 并交给管理器；可在每轮对话后无条件调用
    pub fn sync_phase(&mut self) -> Vec<String> {
        self.last_active = Instant::now();
        let (phase, percentage) = self.collected.progress();
        let new_tools = self.manager.update(phase.as_str(), percentage);
        if !new_tools.is_empty() {
            self.tools_enabled = true;
            tracing::info!(
                conversation = %self.id,
                phase = %phase,
                percentage,
                new_tools = ?new_tools,
                "tools enabled"
            );
        }
        new_tools
    }

    /// 开始新会话：新 ID，清空历史、已收集信息、工具状态
    pub fn reset(&mut self) {
        let old = std::mem::replace(&mut self.id, new_conversation_id());
        self.created_at = Utc::now();
        self.last_active = Instant::now();
        self.history.clear();
        self.collected = CollectedInfo::default();
        self.manager.reset();
        self.tools_enabled = false;
        tracing::info!(old = %old, new = %self.id, "conversation reset");
    }

    pub fn status(&self) -> PhaseStatus {
        self.manager.status()
    }

    pub fn ui_state(&self) -> UiState {
        UiState {
            conversation_id: self.id.clone(),
            phase: self.manager.current_phase().to_string(),
            percentage: self.manager.current_percentage(),
            tools_enabled: self.tools_enabled,
            active_tools: self.manager.active_tools(),
            history: self.history.messages().to_vec(),
        }
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            message_count: self.history.len(),
            tools_enabled: self.tools_enabled,
            collected: self.collected.clone(),
            status: self.manager.status(),
        }
    }
}

fn new_conversation_id() -> String {
    format!("conv_{}", uuid::Uuid::new_v4())
}
