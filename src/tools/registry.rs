//! 工具注册表
//!
//! 工具实现 Tool trait，名称即能力 token（如 web_search、crm_tools）。
//! 注册表本身不关心阶段；按当前激活集合筛选后才交给 Agent 层。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::phase::PhaseToolsManager;

/// 工具 trait：名称（能力 token）、描述（供 LLM 理解）、参数 schema、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// 参数 JSON Schema，默认无参数
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// 已注册的工具名（排序后返回）
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// 已注册且已解锁的工具，按激活顺序
    pub fn allowed_for(&self, manager: &PhaseToolsManager) -> Vec<String> {
        manager
            .active_tools()
            .into_iter()
            .filter(|t| self.tools.contains_key(t))
            .collect()
    }

    /// 只包含已解锁工具的 schema JSON，拼入 system prompt
    pub fn schema_json_for(&self, manager: &PhaseToolsManager) -> String {
        let tools: Vec<Value> = self
            .allowed_for(manager)
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "parameters": tool.parameters_schema()
                })
            })
            .collect();
        serde_json::to_string_pretty(&tools).unwrap_or_else(|_| "[]".to_string())
    }
}
