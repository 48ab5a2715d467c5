//! 会话注册表
//!
//! 每个会话独占一个 ConversationStore，外包一层 Mutex：并发请求落到同一会话时串行执行，
//! 管理器内部「比较再更新」的读改写因此不会交错。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use super::store::{ConversationStore, ConversationSummary};
use crate::config::AppConfig;
use crate::core::IntakeError;
use crate::phase::{NoopSink, PhaseEventSink, PhaseStatus, PhaseTable, TracingSink};

/// 会话 ID（注册表维度，reset 后保持不变；会话内的 conversation id 会变）
pub type SessionId = String;

pub type SharedStore = Arc<Mutex<ConversationStore>>;

pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SharedStore>>,
    table: Arc<PhaseTable>,
    sink: Arc<dyn PhaseEventSink>,
    max_context_turns: usize,
}

impl SessionRegistry {
    pub fn new(
        max_context_turns: usize,
        table: Arc<PhaseTable>,
        sink: Arc<dyn PhaseEventSink>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            table,
            sink,
            max_context_turns,
        }
    }

    /// 按配置构建：阶段表（可被配置覆盖）、是否输出 tracing 事件
    pub fn from_config(config: &AppConfig) -> Result<Self, IntakeError> {
        let table = Arc::new(config.phase_table()?);
        let sink: Arc<dyn PhaseEventSink> = if config.intake.emit_events {
            Arc::new(TracingSink)
        } else {
            Arc::new(NoopSink)
        };
        Ok(Self::new(config.app.max_context_turns, table, sink))
    }

    pub fn table(&self) -> &PhaseTable {
        &self.table
    }

    pub async fn create(&self) -> SessionId {
        let id = format!("session_{}", uuid::Uuid::new_v4());
        let store = ConversationStore::with_parts(
            self.max_context_turns,
            self.table.clone(),
            self.sink.clone(),
        );
        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(store)));
        tracing::info!(session = %id, "session created");
        id
    }

    pub async fn get(&self, session_id: &str) -> Option<SharedStore> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// 在会话锁内执行闭包；注册表读锁在加会话锁之前释放
    pub async fn with_session<F, R>(&self, session_id: &str, f: F) -> Result<R, IntakeError>
    where
        F: FnOnce(&mut ConversationStore) -> R,
    {
        let store = self
            .get(session_id)
            .await
            .ok_or_else(|| IntakeError::UnknownSession(session_id.to_string()))?;
        let mut guard = store.lock().await;
        Ok(f(&mut guard))
    }

    pub async fn status(&self, session_id: &str) -> Result<PhaseStatus, IntakeError> {
        self.with_session(session_id, |s| s.status()).await
    }

    pub async fn summary(&self, session_id: &str) -> Result<ConversationSummary, IntakeError> {
        self.with_session(session_id, |s| s.summary()).await
    }

    pub async fn reset(&self, session_id: &str) -> Result<(), IntakeError> {
        self.with_session(session_id, |s| s.reset()).await
    }

    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// 移除空闲超过 timeout 的会话，返回移除数量
    ///
    /// 先在读锁下拍快照，逐个 try_lock 判断空闲；正被占用的会话视为活跃，跳过。
    /// 写锁只在删除时持有，且删除前再确认一次。
    pub async fn cleanup_expired(&self, timeout: Duration) -> usize {
        let snapshot: Vec<(SessionId, SharedStore)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, store)| (id.clone(), Arc::clone(store)))
            .collect();
        let candidates: Vec<(SessionId, SharedStore)> = snapshot
            .into_iter()
            .filter(|(_, store)| is_idle(store, timeout))
            .collect();
        if candidates.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        let mut removed = 0;
        for (id, store) in candidates {
            let still_expired = sessions
                .get(&id)
                .is_some_and(|current| Arc::ptr_eq(current, &store) && is_idle(current, timeout));
            if still_expired {
                sessions.remove(&id);
                removed += 1;
            }
        }
        drop(sessions);
        if removed > 0 {
            tracing::info!(count = removed, "expired sessions removed");
        }
        removed
    }
}

fn is_idle(store: &SharedStore, timeout: Duration) -> bool {
    store
        .try_lock()
        .map(|conv| conv.idle_for() > timeout)
        .unwrap_or(false)
}
