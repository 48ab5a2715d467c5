pub mod catalog;
pub mod contact_validator;
pub mod executor;
pub mod registry;
pub mod schema;

pub use catalog::{agent_system_prompt, available_tools_prompt, capability_description};
pub use contact_validator::ContactValidatorTool;
pub use executor::GatedExecutor;
pub use registry::{Tool, ToolRegistry};
pub use schema::tool_call_schema_json;
