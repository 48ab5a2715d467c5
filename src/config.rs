//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `LEADFLOW__*` 覆盖（双下划线表示嵌套，如 `LEADFLOW__TOOLS__TOOL_TIMEOUT_SECS=10`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::IntakeError;
use crate::phase::{PhaseMilestone, PhaseTable};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub intake: IntakeSection,
    pub tools: ToolsSection,
    pub phases: PhasesSection,
}

impl AppConfig {
    /// 配置里给了 milestones 就校验后使用，否则用标准表
    pub fn phase_table(&self) -> Result<PhaseTable, IntakeError> {
        match &self.phases.milestones {
            Some(milestones) => PhaseTable::new(milestones.clone()),
            None => Ok(PhaseTable::default()),
        }
    }
}

/// [app] 段：应用名、对话轮数上限
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    /// 对话历史保留轮数
    #[serde(default = "default_max_context_turns")]
    pub max_context_turns: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            max_context_turns: default_max_context_turns(),
        }
    }
}

fn default_max_context_turns() -> usize {
    20
}

/// [intake] 段
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeSection {
    /// 阶段事件是否写入 tracing 日志
    #[serde(default = "default_emit_events")]
    pub emit_events: bool,
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
}

impl Default for IntakeSection {
    fn default() -> Self {
        Self {
            emit_events: default_emit_events(),
            session_timeout_secs: default_session_timeout_secs(),
        }
    }
}

fn default_emit_events() -> bool {
    true
}

fn default_session_timeout_secs() -> u64 {
    3600
}

/// [tools] 段
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    /// 单次工具调用超时（秒）
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

fn default_tool_timeout_secs() -> u64 {
    30
}

/// [phases] 段：`[[phases.milestones]]` 覆盖标准里程碑表
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PhasesSection {
    pub milestones: Option<Vec<PhaseMilestone>>,
}

/// 从 config 目录加载配置，环境变量 LEADFLOW__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 LEADFLOW__*
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, IntakeError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!(path = %path.display(), "config file not found, skipped");
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("LEADFLOW")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    let cfg: AppConfig = c.try_deserialize()?;
    // 提前暴露阶段表配置错误
    cfg.phase_table()?;
    Ok(cfg)
}
