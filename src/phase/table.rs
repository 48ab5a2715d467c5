//! 阶段配置表：(阶段, 里程碑百分比) -> 需要激活的能力 token
//!
//! 表按百分比严格递增排序，查找必须阶段名与百分比同时命中；未命中不是错误，调用方直接忽略。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::IntakeError;

/// 引导对话的阶段（封闭集合）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Initial,
    Country,
    SalesChannels,
    Phone,
    Competitors,
    Demo,
}

impl Phase {
    /// 按引导顺序排列的全部阶段
    pub const ALL: [Phase; 6] = [
        Phase::Initial,
        Phase::Country,
        Phase::SalesChannels,
        Phase::Phone,
        Phase::Competitors,
        Phase::Demo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Initial => "INITIAL",
            Phase::Country => "COUNTRY",
            Phase::SalesChannels => "SALES_CHANNELS",
            Phase::Phone => "PHONE",
            Phase::Competitors => "COMPETITORS",
            Phase::Demo => "DEMO",
        }
    }

    /// 大小写不敏感解析，`sales_channels` 与 `SALES_CHANNELS` 等价；未知名称返回 None
    pub fn parse(name: &str) -> Option<Phase> {
        let upper = name.trim().to_ascii_uppercase();
        Phase::ALL.iter().copied().find(|p| p.as_str() == upper)
    }

    /// 标准里程碑百分比（INITIAL 没有里程碑，对应 0）
    pub fn milestone_percentage(&self) -> i32 {
        match self {
            Phase::Initial => 0,
            Phase::Country => 20,
            Phase::SalesChannels => 40,
            Phase::Phone => 60,
            Phase::Competitors => 80,
            Phase::Demo => 100,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个里程碑：阶段 + 百分比 + 要解锁的工具 + 描述（描述仅供展示）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseMilestone {
    pub phase: String,
    pub percentage: i32,
    pub tools: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl PhaseMilestone {
    fn new(phase: Phase, percentage: i32, tools: &[&str], description: &str) -> Self {
        Self {
            phase: phase.as_str().to_string(),
            percentage,
            tools: tools.iter().map(|t| t.to_string()).collect(),
            description: description.to_string(),
        }
    }
}

/// 里程碑表（进程启动时加载一次，之后只读）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseTable {
    milestones: Vec<PhaseMilestone>,
}

/// 独立阶段表文件的顶层结构：`[[milestones]]` 数组
#[derive(Debug, Deserialize)]
struct PhaseTableFile {
    milestones: Vec<PhaseMilestone>,
}

impl PhaseTable {
    /// 校验后构建：百分比在 1..=100 且严格递增、阶段不重复、工具列表非空
    pub fn new(milestones: Vec<PhaseMilestone>) -> Result<Self, IntakeError> {
        if milestones.is_empty() {
            return Err(IntakeError::InvalidPhaseTable(
                "milestone table is empty".to_string(),
            ));
        }
        let mut last = 0;
        for (i, m) in milestones.iter().enumerate() {
            if m.phase.trim().is_empty() {
                return Err(IntakeError::InvalidPhaseTable(format!(
                    "milestone #{i} has an empty phase name"
                )));
            }
            if !(1..=100).contains(&m.percentage) {
                return Err(IntakeError::InvalidPhaseTable(format!(
                    "{}: percentage {} outside 1..=100",
                    m.phase, m.percentage
                )));
            }
            if m.percentage <= last {
                return Err(IntakeError::InvalidPhaseTable(format!(
                    "{}: percentage {} is not greater than previous {}",
                    m.phase, m.percentage, last
                )));
            }
            if milestones[..i].iter().any(|prev| prev.phase == m.phase) {
                return Err(IntakeError::InvalidPhaseTable(format!(
                    "duplicate phase {}",
                    m.phase
                )));
            }
            if m.tools.is_empty() {
                return Err(IntakeError::InvalidPhaseTable(format!(
                    "{}: no tools configured",
                    m.phase
                )));
            }
            last = m.percentage;
        }
        Ok(Self { milestones })
    }

    /// 从独立 TOML 文件内容解析（`[[milestones]]` 数组）
    pub fn from_toml_str(content: &str) -> Result<Self, IntakeError> {
        let file: PhaseTableFile = toml::from_str(content)
            .map_err(|e| IntakeError::InvalidPhaseTable(e.to_string()))?;
        Self::new(file.milestones)
    }

    /// 精确匹配 (phase, percentage)
    pub fn lookup(&self, phase: &str, percentage: i32) -> Option<&PhaseMilestone> {
        self.milestones
            .iter()
            .find(|m| m.phase == phase && m.percentage == percentage)
    }

    /// 未命中时返回空列表
    pub fn tools_for(&self, phase: &str, percentage: i32) -> Vec<String> {
        self.lookup(phase, percentage)
            .map(|m| m.tools.clone())
            .unwrap_or_default()
    }

    pub fn all(&self) -> &[PhaseMilestone] {
        &self.milestones
    }

    /// 表中出现过的全部 token（去重，保持首次出现顺序）
    pub fn distinct_tools(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for tool in self.milestones.iter().flat_map(|m| m.tools.iter()) {
            if !out.contains(tool) {
                out.push(tool.clone());
            }
        }
        out
    }
}

impl Default for PhaseTable {
    /// 标准五段里程碑表
    fn default() -> Self {
        Self {
            milestones: vec![
                PhaseMilestone::new(
                    Phase::Country,
                    20,
                    &["web_search", "country_research"],
                    "Target country market research tools",
                ),
                PhaseMilestone::new(
                    Phase::SalesChannels,
                    40,
                    &["web_search", "channel_analyzer", "market_research"],
                    "Sales channels analysis and market research tools",
                ),
                PhaseMilestone::new(
                    Phase::Phone,
                    60,
                    &["web_search", "contact_validator", "crm_tools"],
                    "Contact validation and CRM integration tools",
                ),
                PhaseMilestone::new(
                    Phase::Competitors,
                    80,
                    &[
                        "web_search",
                        "competitor_finder",
                        "market_analysis",
                        "competitor_research",
                    ],
                    "Competitor research and market analysis tools",
                ),
                PhaseMilestone::new(
                    Phase::Demo,
                    100,
                    &[
                        "web_search",
                        "report_generator",
                        "demo_scheduler",
                        "crm_integration",
                    ],
                    "Demo preparation and CRM integration tools",
                ),
            ],
        }
    }
}
