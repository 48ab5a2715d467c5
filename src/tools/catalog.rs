//! 能力目录：标准 token 的说明文字，用于拼装 Agent 的「可用工具」提示段

use crate::phase::PhaseToolsManager;
use crate::tools::{tool_call_schema_json, ToolRegistry};

const CATALOG: &[(&str, &str)] = &[
    ("web_search", "Search the public web for market and company information"),
    ("country_research", "Summarize import rules, demand and trade data for the target country"),
    ("channel_analyzer", "Compare the sales channels the lead uses or plans to use"),
    ("market_research", "Estimate market size and buyer segments"),
    ("contact_validator", "Validate and normalize the lead's phone number"),
    ("crm_tools", "Create or update the lead record in the CRM"),
    ("competitor_finder", "Find exporters competing in the same market"),
    ("market_analysis", "Analyze pricing and positioning against competitors"),
    ("competitor_research", "Collect details on named competitors"),
    ("report_generator", "Generate the lead's export opportunity report"),
    ("demo_scheduler", "Propose and book a product demo slot"),
    ("crm_integration", "Sync the completed intake to the CRM pipeline"),
];

pub fn capability_description(token: &str) -> Option<&'static str> {
    CATALOG
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, desc)| *desc)
}

/// 「Available tools」提示段，只列出已解锁的 token；未收录的 token 只写名字
pub fn available_tools_prompt(manager: &PhaseToolsManager) -> String {
    let active = manager.active_tools();
    if active.is_empty() {
        return "Available tools: none yet. Keep collecting the lead's details.".to_string();
    }
    let mut out = String::from("Available tools:\n");
    for token in active {
        match capability_description(&token) {
            Some(desc) => out.push_str(&format!("- {}: {}\n", token, desc)),
            None => out.push_str(&format!("- {}\n", token)),
        }
    }
    out
}

/// Agent 的 system prompt：可用工具说明 + 可调用工具的参数 schema + 调用格式
pub fn agent_system_prompt(manager: &PhaseToolsManager, registry: &ToolRegistry) -> String {
    let mut out = String::from(
        "You guide an exporter through lead intake: target country, sales channels, \
         phone, competitors, then a demo.\n\n",
    );
    out.push_str(&available_tools_prompt(manager));
    if registry.allowed_for(manager).is_empty() {
        return out;
    }
    out.push_str("\nCallable tools (JSON schema):\n");
    out.push_str(&registry.schema_json_for(manager));
    out.push_str("\n\nTo call a tool, reply with JSON matching:\n");
    out.push_str(&tool_call_schema_json());
    out
}
