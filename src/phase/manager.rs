//! 阶段工具管理器：引导对话里唯一有状态的部分
//!
//! 每次 update(phase, percentage) 与上一次状态比较，算出新解锁的工具 token 并累加到激活集合；
//! 激活集合只增不减（reset 除外）。相同参数的重复调用是空操作，不会重复触发事件。
//!
//! 注意：非相同调用总会覆盖当前阶段指针（包括百分比回退），但只有百分比严格上升时才会激活工具。

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use super::events::{NoopSink, PhaseEvent, PhaseEventSink};
use super::table::{Phase, PhaseTable};

/// 诊断用状态快照
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseStatus {
    pub phase: String,
    pub percentage: i32,
    pub active_tools: Vec<String>,
    pub total_active_tools: usize,
}

/// 每个会话独占一个实例；同一实例被多个执行上下文共享时由调用方加锁
pub struct PhaseToolsManager {
    table: Arc<PhaseTable>,
    /// 按激活顺序保存，便于稳定输出
    active_tools: Vec<String>,
    active_set: HashSet<String>,
    current_phase: String,
    current_percentage: i32,
    sink: Arc<dyn PhaseEventSink>,
}

impl PhaseToolsManager {
    /// 使用标准里程碑表
    pub fn new() -> Self {
        Self::with_table(Arc::new(PhaseTable::default()))
    }

    pub fn with_table(table: Arc<PhaseTable>) -> Self {
        Self {
            table,
            active_tools: Vec::new(),
            active_set: HashSet::new(),
            current_phase: Phase::Initial.as_str().to_string(),
            current_percentage: 0,
            sink: Arc::new(NoopSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn PhaseEventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// 推进阶段，返回本次新解锁的 token（可能为空，从不失败）
    pub fn update(&mut self, phase: &str, percentage: i32) -> Vec<String> {
        if phase == self.current_phase && percentage == self.current_percentage {
            return Vec::new();
        }

        let previous_percentage = self.current_percentage;
        let previous_phase = std::mem::replace(&mut self.current_phase, phase.to_string());
        self.current_percentage = percentage;
        self.sink.emit(&PhaseEvent::PhaseChanged {
            from_phase: previous_phase,
            from_percentage: previous_percentage,
            to_phase: phase.to_string(),
            to_percentage: percentage,
        });

        if percentage <= previous_percentage {
            tracing::debug!(
                phase,
                percentage,
                previous_percentage,
                "no activation: percentage not increased"
            );
            return Vec::new();
        }

        let Some(milestone) = self.table.lookup(phase, percentage) else {
            tracing::debug!(phase, percentage, "no milestone configured");
            return Vec::new();
        };

        let mut new_tools = Vec::new();
        for tool in &milestone.tools {
            if self.active_set.insert(tool.clone()) {
                self.active_tools.push(tool.clone());
                new_tools.push(tool.clone());
            }
        }

        if !new_tools.is_empty() {
            self.sink.emit(&PhaseEvent::ToolsActivated {
                phase: phase.to_string(),
                percentage,
                tools: new_tools.clone(),
            });
        }
        new_tools
    }

    /// 类型化入口：使用阶段的标准百分比
    pub fn advance_to(&mut self, phase: Phase) -> Vec<String> {
        self.update(phase.as_str(), phase.milestone_percentage())
    }

    /// 清空激活集合并回到 (INITIAL, 0)；重复调用无副作用
    pub fn reset(&mut self) {
        self.active_tools.clear();
        self.active_set.clear();
        self.current_phase = Phase::Initial.as_str().to_string();
        self.current_percentage = 0;
        self.sink.emit(&PhaseEvent::Reset);
    }

    /// 激活集合快照（按激活顺序）
    pub fn active_tools(&self) -> Vec<String> {
        self.active_tools.clone()
    }

    pub fn is_tool_active(&self, token: &str) -> bool {
        self.active_set.contains(token)
    }

    pub fn current_phase(&self) -> &str {
        &self.current_phase
    }

    pub fn current_percentage(&self) -> i32 {
        self.current_percentage
    }

    pub fn table(&self) -> &PhaseTable {
        &self.table
    }

    pub fn status(&self) -> PhaseStatus {
        PhaseStatus {
            phase: self.current_phase.clone(),
            percentage: self.current_percentage,
            active_tools: self.active_tools.clone(),
            total_active_tools: self.active_tools.len(),
        }
    }
}

impl Default for PhaseToolsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PhaseToolsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseToolsManager")
            .field("current_phase", &self.current_phase)
            .field("current_percentage", &self.current_percentage)
            .field("active_tools", &self.active_tools)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::ChannelSink;

    fn set(tools: &[String]) -> HashSet<String> {
        tools.iter().cloned().collect()
    }

    #[test]
    fn test_initial_state() {
        let m = PhaseToolsManager::new();
        let status = m.status();
        assert_eq!(status.phase, "INITIAL");
        assert_eq!(status.percentage, 0);
        assert!(status.active_tools.is_empty());
        assert_eq!(status.total_active_tools, 0);
    }

    #[test]
    fn test_union_correctness() {
        let mut m = PhaseToolsManager::new();
        assert_eq!(m.update("COUNTRY", 20), vec!["web_search", "country_research"]);
        assert_eq!(
            m.update("SALES_CHANNELS", 40),
            vec!["channel_analyzer", "market_research"]
        );
        // web_search 两段都有，并集只有 4 个
        assert_eq!(
            m.active_tools(),
            vec!["web_search", "country_research", "channel_analyzer", "market_research"]
        );
        assert_eq!(m.status().total_active_tools, 4);
        assert!(m.is_tool_active("web_search"));
        assert!(m.is_tool_active("market_research"));
        assert!(!m.is_tool_active("crm_tools"));
    }

    #[test]
    fn test_identical_update_is_noop() {
        let mut m = PhaseToolsManager::new();
        assert!(!m.update("COUNTRY", 20).is_empty());
        let before = m.active_tools();
        assert!(m.update("COUNTRY", 20).is_empty());
        assert_eq!(m.active_tools(), before);
    }

    #[test]
    fn test_regression_moves_pointer_without_activation() {
        let mut m = PhaseToolsManager::new();
        m.update("PHONE", 60);
        assert!(m.update("COUNTRY", 20).is_empty());
        assert!(!m.is_tool_active("country_research"));
        assert_eq!(m.current_phase(), "COUNTRY");
        assert_eq!(m.current_percentage(), 20);
    }

    #[test]
    fn test_reclimb_after_regression_adds_nothing_new() {
        let mut m = PhaseToolsManager::new();
        m.update("COUNTRY", 20);
        m.update("PHONE", 60);
        m.update("COUNTRY", 20);
        // 百分比再次上升，但 PHONE 的工具都已激活
        assert!(m.update("PHONE", 60).is_empty());
        assert_eq!(m.active_tools().len(), 4);
    }

    #[test]
    fn test_unknown_milestone_is_noop() {
        let mut m = PhaseToolsManager::new();
        assert!(m.update("COUNTRY", 25).is_empty());
        assert_eq!(m.current_percentage(), 25);
        assert!(m.update("SHIPPING", 50).is_empty());
        assert!(m.update("", -5).is_empty());
        assert!(m.active_tools().is_empty());
    }

    #[test]
    fn test_skipping_milestones() {
        let mut m = PhaseToolsManager::new();
        assert_eq!(
            set(&m.update("DEMO", 100)),
            set(&[
                "web_search".to_string(),
                "report_generator".to_string(),
                "demo_scheduler".to_string(),
                "crm_integration".to_string(),
            ])
        );
        // 跳过的里程碑在百分比回退后不会再激活
        assert!(m.update("COUNTRY", 20).is_empty());
    }

    #[test]
    fn test_monotonic_accumulation() {
        let mut m = PhaseToolsManager::new();
        let calls = [
            ("COUNTRY", 20),
            ("COUNTRY", 25),
            ("PHONE", 60),
            ("COUNTRY", 20),
            ("SALES_CHANNELS", 40),
            ("DEMO", 100),
            ("DEMO", 100),
            ("COMPETITORS", 80),
        ];
        let mut prev = set(&m.active_tools());
        for (phase, pct) in calls {
            let added = m.update(phase, pct);
            let now = set(&m.active_tools());
            assert!(now.is_superset(&prev));
            assert_eq!(now.difference(&prev).cloned().collect::<HashSet<_>>(), set(&added));
            prev = now;
        }
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut m = PhaseToolsManager::new();
        m.update("COUNTRY", 20);
        m.update("PHONE", 60);
        m.reset();
        assert!(m.active_tools().is_empty());
        assert_eq!(m.current_phase(), "INITIAL");
        assert_eq!(m.current_percentage(), 0);
        m.reset();
        assert_eq!(m.status(), PhaseToolsManager::new().status());
        assert_eq!(m.update("COUNTRY", 20), vec!["web_search", "country_research"]);
    }

    #[test]
    fn test_end_to_end() {
        let mut m = PhaseToolsManager::new();
        assert_eq!(m.advance_to(Phase::Country), vec!["web_search", "country_research"]);
        assert_eq!(
            m.advance_to(Phase::SalesChannels),
            vec!["channel_analyzer", "market_research"]
        );
        assert_eq!(m.advance_to(Phase::Phone), vec!["contact_validator", "crm_tools"]);
        assert_eq!(
            m.advance_to(Phase::Competitors),
            vec!["competitor_finder", "market_analysis", "competitor_research"]
        );
        assert_eq!(
            m.advance_to(Phase::Demo),
            vec!["report_generator", "demo_scheduler", "crm_integration"]
        );
        let status = m.status();
        assert_eq!(status.total_active_tools, 12);
        assert_eq!(status.phase, "DEMO");
        assert_eq!(status.percentage, 100);
        // 最后一个里程碑之后仍可调用
        assert!(m.update("DEMO", 120).is_empty());
    }

    #[test]
    fn test_returned_snapshot_is_detached() {
        let mut m = PhaseToolsManager::new();
        m.update("COUNTRY", 20);
        let snapshot = m.active_tools();
        m.update("SALES_CHANNELS", 40);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let mut m = PhaseToolsManager::new();
        m.update("COUNTRY", 20);
        let v = serde_json::to_value(m.status()).unwrap();
        assert_eq!(v["totalActiveTools"], 2);
        assert_eq!(v["activeTools"][1], "country_research");
        assert_eq!(v["phase"], "COUNTRY");
    }

    #[test]
    fn test_events_emitted() {
        let (sink, mut rx) = ChannelSink::new();
        let mut m = PhaseToolsManager::new().with_sink(Arc::new(sink));
        m.update("COUNTRY", 20);
        m.update("COUNTRY", 20);
        m.update("COUNTRY", 10);
        m.reset();

        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], PhaseEvent::PhaseChanged { to_percentage: 20, .. }));
        assert!(matches!(&events[1], PhaseEvent::ToolsActivated { tools, .. } if tools.len() == 2));
        assert!(matches!(events[2], PhaseEvent::PhaseChanged { from_percentage: 20, to_percentage: 10, .. }));
        assert_eq!(events[3], PhaseEvent::Reset);
    }

    #[test]
    fn test_custom_table() {
        let table = PhaseTable::from_toml_str(
            r#"
[[milestones]]
phase = "COUNTRY"
percentage = 50
tools = ["web_search", "web_search", "atlas"]
"#,
        )
        .unwrap();
        let mut m = PhaseToolsManager::with_table(Arc::new(table));
        assert!(m.update("COUNTRY", 20).is_empty());
        assert_eq!(m.update("COUNTRY", 50), vec!["web_search", "atlas"]);
    }
}
