//! 对话历史
//!
//! 保留最近 N 轮（user/assistant 对）消息，超出时丢弃最旧部分，供 Agent 上下文与 UI 渲染使用。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// 最近 N 轮对话（实际保留约 max_turns*2 条消息）
#[derive(Clone, Debug)]
pub struct ConversationMemory {
    messages: Vec<Message>,
    max_turns: usize,
}

impl ConversationMemory {
    pub fn new(max_turns: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_turns,
        }
    }

    pub fn push(&mut self, msg: Message) {
        self.messages.push(msg);
        self.prune();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn prune(&mut self) {
        let keep = self.max_turns * 2;
        if self.messages.len() > keep {
            self.messages.drain(..self.messages.len() - keep);
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_keeps_recent_turns() {
        let mut mem = ConversationMemory::new(2);
        for i in 0..6 {
            mem.push(Message::user(format!("u{i}")));
        }
        assert_eq!(mem.len(), 4);
        assert_eq!(mem.messages()[0].content, "u2");
    }

    #[test]
    fn test_last_user_message() {
        let mut mem = ConversationMemory::new(10);
        assert!(mem.last_user_message().is_none());
        mem.push(Message::user("Germany"));
        mem.push(Message::assistant("Great, which channels?"));
        assert_eq!(mem.last_user_message().unwrap().content, "Germany");
        mem.clear();
        assert!(mem.is_empty());
    }
}
