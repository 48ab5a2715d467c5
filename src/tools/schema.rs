//! 工具调用 JSON Schema（schemars 生成）
//!
//! 注入 system prompt，约束 Agent 输出 `{"tool": "...", "args": {...}}` 格式。

use schemars::{schema_for, JsonSchema};
use std::collections::HashMap;

#[allow(dead_code)]
#[derive(JsonSchema)]
struct ToolCallFormat {
    /// 已解锁的能力 token，如 web_search、contact_validator
    pub tool: String,
    /// 工具参数，依工具不同而不同（query、phone、country 等）
    pub args: HashMap<String, String>,
}

pub fn tool_call_schema_json() -> String {
    let schema = schema_for!(ToolCallFormat);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| String::new())
}
