use async_trait::async_trait;
use chrono::{ DateTime, Utc };
use log::debug;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::HistoryStore;
use crate::models::chat::ChatTurn;

struct Session {
    turns: Vec<ChatTurn>,
    last_active: DateTime<Utc>,
}

/// In-process history store with hard caps: each session keeps only its most
/// recent turns, and the least-recently-active session is evicted once the
/// session cap is hit. Nothing survives a restart.
pub struct MemoryHistoryStore {
    sessions: Mutex<HashMap<String, Session>>,
    max_turns: usize,
    max_sessions: usize,
}

impl MemoryHistoryStore {
    pub fn new(max_turns: usize, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_turns: max_turns.max(1),
            max_sessions: max_sessions.max(1),
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, session_id: &str, turns: &[ChatTurn]) {
        if turns.is_empty() {
            return;
        }
        let mut sessions = self.sessions.lock().await;

        if !sessions.contains_key(session_id) && sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, s)| s.last_active)
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                debug!("Evicting idle session '{}'", id);
                sessions.remove(&id);
            }
        }

        let session = sessions.entry(session_id.to_string()).or_insert_with(|| Session {
            turns: Vec::new(),
            last_active: Utc::now(),
        });
        session.turns.extend_from_slice(turns);
        if session.turns.len() > self.max_turns {
            let excess = session.turns.len() - self.max_turns;
            session.turns.drain(..excess);
        }
        session.last_active = Utc::now();
    }

    async fn recent(&self, session_id: &str) -> Vec<ChatTurn> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(session_id)
            .map(|s| s.turns.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appended_turns_come_back_in_order() {
        let store = MemoryHistoryStore::new(10, 10);
        store.append("s1", &[ChatTurn::user("q1"), ChatTurn::assistant("a1")]).await;
        store.append("s1", &[ChatTurn::user("q2")]).await;

        let turns = store.recent("s1").await;
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[2].content, "q2");
    }

    #[tokio::test]
    async fn unknown_session_is_empty() {
        let store = MemoryHistoryStore::new(10, 10);
        assert!(store.recent("nope").await.is_empty());
    }

    #[tokio::test]
    async fn turn_cap_keeps_most_recent() {
        let store = MemoryHistoryStore::new(3, 10);
        for i in 0..5 {
            store.append("s1", &[ChatTurn::user(format!("m{}", i))]).await;
        }
        let turns = store.recent("s1").await;
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "m2");
        assert_eq!(turns[2].content, "m4");
    }

    #[tokio::test]
    async fn session_cap_evicts_least_recently_active() {
        let store = MemoryHistoryStore::new(10, 2);
        store.append("old", &[ChatTurn::user("a")]).await;
        store.append("busy", &[ChatTurn::user("b")]).await;
        // Touch "busy" again so "old" is the idle session.
        store.append("busy", &[ChatTurn::user("c")]).await;
        store.append("new", &[ChatTurn::user("d")]).await;

        assert!(store.recent("old").await.is_empty());
        assert_eq!(store.recent("busy").await.len(), 2);
        assert_eq!(store.recent("new").await.len(), 1);
    }

    #[tokio::test]
    async fn empty_append_creates_no_session() {
        let store = MemoryHistoryStore::new(10, 1);
        store.append("s1", &[]).await;
        store.append("s2", &[ChatTurn::user("x")]).await;
        assert_eq!(store.recent("s2").await.len(), 1);
    }
}
