//! 引导式获客对话：已收集信息、会话状态存储、会话注册表、控制台指令

pub mod collected;
pub mod command;
pub mod session;
pub mod store;

pub use collected::{normalize_phone, CollectedInfo};
pub use command::IntakeCommand;
pub use session::{SessionId, SessionRegistry, SharedStore};
pub use store::{ConversationStore, ConversationSummary};
