//! 核心层：错误类型、UI 状态投影

pub mod error;
pub mod state;

pub use error::IntakeError;
pub use state::UiState;
