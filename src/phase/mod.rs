//! 阶段门控：里程碑配置表、工具激活状态机、阶段事件

pub mod events;
pub mod manager;
pub mod table;

pub use events::{ChannelSink, NoopSink, PhaseEvent, PhaseEventSink, TracingSink};
pub use manager::{PhaseStatus, PhaseToolsManager};
pub use table::{Phase, PhaseMilestone, PhaseTable};
