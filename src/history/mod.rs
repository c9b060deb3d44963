pub mod memory;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::sync::Arc;

use crate::cli::Args;
use crate::models::chat::ChatTurn;
use self::memory::MemoryHistoryStore;

/// Per-session conversation storage, keyed by a caller-supplied session id.
/// Implementations are size-bounded; callers that want full control resend
/// explicit history per request instead.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, session_id: &str, turns: &[ChatTurn]);
    async fn recent(&self, session_id: &str) -> Vec<ChatTurn>;
}

pub fn new_history_store(args: &Args) -> Arc<dyn HistoryStore> {
    Arc::new(MemoryHistoryStore::new(args.history_max_turns, args.history_max_sessions))
}

/// Parses a caller-supplied history string. Anything that is not a JSON array
/// of `{role, content}` objects is treated as no history; well-formed turns
/// pass through unvalidated.
pub fn parse_history(raw: Option<&str>) -> Vec<ChatTurn> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => parse_history_value(&value),
        Err(e) => {
            debug!("Ignoring malformed history: {}", e);
            Vec::new()
        }
    }
}

/// Same leniency for history already parsed as JSON (the base64 endpoint).
/// A malformed array, or malformed entries inside it, silently contribute
/// nothing.
pub fn parse_history_value(value: &Value) -> Vec<ChatTurn> {
    let Some(entries) = value.as_array() else {
        if !value.is_null() {
            debug!("Ignoring history that is not a JSON array");
        }
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let role = entry.get("role")?.as_str()?;
            let content = entry.get("content")?.as_str()?;
            Some(ChatTurn::new(role, content))
        })
        .collect()
}
