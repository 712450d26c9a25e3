use std::{collections::HashMap, sync::Arc};

use axum::extract::FromRef;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{config::Config, provider::CompletionProvider, session::QuizSession};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub provider: Arc<dyn CompletionProvider>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            sessions: SessionStore::with_capacity(config.max_sessions),
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CompletionProvider> {
    fn from_ref(state: &AppState) -> Self {
        state.provider.clone()
    }
}

struct SessionEntry {
    session: Arc<Mutex<QuizSession>>,
    created_at: DateTime<Utc>,
}

/// One independent `QuizSession` per user, keyed by session id.
///
/// Each session sits behind its own lock so users never contend with each
/// other beyond the brief map lookup. At most `capacity` sessions are live.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_capacity(usize::MAX)
    }
}

impl SessionStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Registers a fresh session and returns its id, or `None` when the store is full.
    pub async fn create(&self) -> Option<Uuid> {
        let mut sessions = self.inner.write().await;
        if sessions.len() >= self.capacity {
            tracing::warn!(capacity = self.capacity, "Session store is full");
            return None;
        }

        let id = Uuid::new_v4();
        let entry = SessionEntry {
            session: Arc::new(Mutex::new(QuizSession::new())),
            created_at: Utc::now(),
        };
        sessions.insert(id, entry);
        Some(id)
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<Mutex<QuizSession>>> {
        self.inner
            .read()
            .await
            .get(id)
            .map(|entry| entry.session.clone())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops sessions created more than `ttl_seconds` ago; their tokens have expired.
    pub async fn purge_expired(&self, ttl_seconds: u64) -> usize {
        let cutoff = i64::try_from(ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.created_at > cutoff);
        let purged = before - sessions.len();
        if purged > 0 {
            tracing::info!(purged, "Purged expired quiz sessions");
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::default();
        let a = store.create().await.unwrap();
        let b = store.create().await.unwrap();
        assert_ne!(a, b);

        let session_a = store.get(&a).await.unwrap();
        session_a.lock().await.next_generation_hint("rust");

        let session_b = store.get(&b).await.unwrap();
        assert_eq!(session_b.lock().await.last_context(), None);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = SessionStore::default();
        assert!(store.get(&Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_fresh_sessions() {
        let store = SessionStore::default();
        store.create().await.unwrap();
        assert_eq!(store.purge_expired(3600).await, 0);
        assert_eq!(store.purge_expired(0).await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_refuses_when_full() {
        let store = SessionStore::with_capacity(2);
        assert!(store.create().await.is_some());
        assert!(store.create().await.is_some());
        assert!(store.create().await.is_none());
        assert_eq!(store.len().await, 2);

        // Expiry frees room again
        store.purge_expired(0).await;
        assert!(store.create().await.is_some());
    }
}
