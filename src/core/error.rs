//! 错误类型
//!
//! 阶段状态机本身没有错误路径；错误只来自外围：配置、字段校验、会话查找、工具调用。

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Invalid phase table: {0}")]
    InvalidPhaseTable(String),

    /// 收集到的字段不合法（字段名, 原因）
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    /// 工具已注册但当前阶段尚未解锁
    #[error("Tool locked: {0}")]
    ToolLocked(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool failed: {0}")]
    ToolFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl IntakeError {
    pub(crate) fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        IntakeError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
