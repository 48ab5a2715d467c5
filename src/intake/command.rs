//! 控制台指令：把一行文本解析为对会话的操作，并生成回显文本

use super::store::ConversationStore;
use crate::core::IntakeError;
use crate::memory::Message;
use crate::tools::{agent_system_prompt, GatedExecutor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeCommand {
    Country(String),
    Channels(String),
    Phone(String),
    Competitors(String),
    Demo,
    Status,
    Reset,
    /// 生成当前阶段的 system prompt 并记入历史
    Prompt,
    /// `tool <name> <json>`，参数缺省为 `{}`
    Tool { name: String, args: String },
    Quit,
    /// 其他输入视为普通聊天消息
    Say(String),
}

impl IntakeCommand {
    pub fn parse(line: &str) -> Option<IntakeCommand> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((h, r)) => (h, r.trim().to_string()),
            None => (line, String::new()),
        };
        let cmd = match head.to_ascii_lowercase().as_str() {
            "country" => IntakeCommand::Country(rest),
            "channels" => IntakeCommand::Channels(rest),
            "phone" => IntakeCommand::Phone(rest),
            "competitors" => IntakeCommand::Competitors(rest),
            "demo" => IntakeCommand::Demo,
            "status" => IntakeCommand::Status,
            "reset" => IntakeCommand::Reset,
            "prompt" => IntakeCommand::Prompt,
            "tool" if !rest.is_empty() => {
                let (name, args) = match rest.split_once(char::is_whitespace) {
                    Some((n, a)) => (n.to_string(), a.trim().to_string()),
                    None => (rest, "{}".to_string()),
                };
                IntakeCommand::Tool { name, args }
            }
            "quit" | "exit" => IntakeCommand::Quit,
            _ => IntakeCommand::Say(line.to_string()),
        };
        Some(cmd)
    }

    /// 执行指令并返回要展示的文本；Quit 由调用方处理
    pub async fn apply(
        self,
        store: &mut ConversationStore,
        executor: &GatedExecutor,
    ) -> Result<String, IntakeError> {
        let unlocked = match self {
            IntakeCommand::Country(v) => store.record_country(&v)?,
            IntakeCommand::Channels(v) => store.record_sales_channels(&v)?,
            IntakeCommand::Phone(v) => store.record_phone(&v)?,
            IntakeCommand::Competitors(v) => store.record_competitors(&v)?,
            IntakeCommand::Demo => store.request_demo(),
            IntakeCommand::Status => {
                let status = store.status();
                return Ok(format!(
                    "{} {}% | {} tools: {}",
                    status.phase,
                    status.percentage,
                    status.total_active_tools,
                    status.active_tools.join(", ")
                ));
            }
            IntakeCommand::Reset => {
                store.reset();
                return Ok(format!("new conversation {}", store.id()));
            }
            IntakeCommand::Prompt => {
                let prompt = agent_system_prompt(store.manager(), executor.registry());
                store.push_message(Message::system(prompt.clone()));
                return Ok(prompt);
            }
            IntakeCommand::Tool { name, args } => {
                let args: serde_json::Value = serde_json::from_str(&args)
                    .map_err(|e| IntakeError::invalid_field("tool_args", e.to_string()))?;
                return executor.execute(store.manager(), &name, args).await;
            }
            IntakeCommand::Quit => return Ok(String::new()),
            IntakeCommand::Say(text) => {
                store.push_message(Message::user(text));
                store.sync_phase()
            }
        };
        let status = store.status();
        if unlocked.is_empty() {
            Ok(format!("{} {}%", status.phase, status.percentage))
        } else {
            Ok(format!(
                "{} {}% | unlocked: {}",
                status.phase,
                status.percentage,
                unlocked.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::memory::Role;
    use crate::tools::{ContactValidatorTool, ToolRegistry};

    #[test]
    fn test_parse() {
        assert_eq!(IntakeCommand::parse("   "), None);
        assert_eq!(
            IntakeCommand::parse("country  United States "),
            Some(IntakeCommand::Country("United States".to_string()))
        );
        assert_eq!(IntakeCommand::parse("DEMO"), Some(IntakeCommand::Demo));
        assert_eq!(IntakeCommand::parse("exit"), Some(IntakeCommand::Quit));
        assert_eq!(
            IntakeCommand::parse(r#"tool contact_validator {"phone": "0123456789"}"#),
            Some(IntakeCommand::Tool {
                name: "contact_validator".to_string(),
                args: r#"{"phone": "0123456789"}"#.to_string(),
            })
        );
        assert_eq!(
            IntakeCommand::parse("tool web_search"),
            Some(IntakeCommand::Tool {
                name: "web_search".to_string(),
                args: "{}".to_string(),
            })
        );
        assert_eq!(
            IntakeCommand::parse("hello there"),
            Some(IntakeCommand::Say("hello there".to_string()))
        );
    }

    fn executor() -> GatedExecutor {
        let mut reg = ToolRegistry::new();
        reg.register(ContactValidatorTool);
        GatedExecutor::from_config(&AppConfig::default(), reg)
    }

    #[tokio::test]
    async fn test_apply_reports_unlocks() {
        let exec = executor();
        let mut store = ConversationStore::new(20);
        let out = IntakeCommand::Country("Egypt".into())
            .apply(&mut store, &exec)
            .await
            .unwrap();
        assert_eq!(out, "COUNTRY 20% | unlocked: web_search, country_research");

        let out = IntakeCommand::Say("thanks".into())
            .apply(&mut store, &exec)
            .await
            .unwrap();
        assert_eq!(out, "COUNTRY 20%");
        assert_eq!(store.messages().len(), 1);

        let out = IntakeCommand::Status.apply(&mut store, &exec).await.unwrap();
        assert!(out.starts_with("COUNTRY 20% | 2 tools"));

        assert!(IntakeCommand::Phone("nope".into())
            .apply(&mut store, &exec)
            .await
            .is_err());

        let out = IntakeCommand::Reset.apply(&mut store, &exec).await.unwrap();
        assert!(out.starts_with("new conversation conv_"));
    }

    #[tokio::test]
    async fn test_tool_command_is_gated() {
        let exec = executor();
        let mut store = ConversationStore::new(20);
        let call = || IntakeCommand::Tool {
            name: "contact_validator".to_string(),
            args: r#"{"phone": "+1 555 010 9999"}"#.to_string(),
        };

        assert!(matches!(
            call().apply(&mut store, &exec).await,
            Err(IntakeError::ToolLocked(_))
        ));

        store.record_country("Canada").unwrap();
        store.record_sales_channels("retail").unwrap();
        store.record_phone("+1 555 010 9999").unwrap();
        let out = call().apply(&mut store, &exec).await.unwrap();
        assert!(out.contains("+15550109999"));

        let bad = IntakeCommand::Tool {
            name: "contact_validator".to_string(),
            args: "{not json".to_string(),
        };
        assert!(matches!(
            bad.apply(&mut store, &exec).await,
            Err(IntakeError::InvalidField { field: "tool_args", .. })
        ));
    }

    #[tokio::test]
    async fn test_prompt_recorded_as_system_message() {
        let exec = executor();
        let mut store = ConversationStore::new(20);
        store.record_country("Kenya").unwrap();

        let out = IntakeCommand::Prompt.apply(&mut store, &exec).await.unwrap();
        assert!(out.contains("- country_research:"));
        let last = store.messages().last().unwrap();
        assert_eq!(last.role, Role::System);
        assert_eq!(last.content, out);
    }
}
