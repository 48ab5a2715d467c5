//! Leadflow - 出口获客引导对话后端
//!
//! 模块划分：
//! - **phase**: 里程碑配置表与阶段工具管理器（按进度逐步解锁 Agent 工具）
//! - **intake**: 已收集信息、会话状态存储、会话注册表
//! - **tools**: 工具注册表、阶段门控执行器、能力目录
//! - **memory**: 对话历史
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、UI 状态投影
//! - **admin**: 诊断接口（feature = "admin"）

#[cfg(feature = "admin")]
pub mod admin;
pub mod config;
pub mod core;
pub mod intake;
pub mod memory;
pub mod observability;
pub mod phase;
pub mod tools;

pub use intake::{ConversationStore, SessionRegistry};
pub use phase::{Phase, PhaseStatus, PhaseTable, PhaseToolsManager};
