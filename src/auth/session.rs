use async_trait::async_trait;
use dashmap::DashMap;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_id";

/// Server-side session storage: maps an opaque session id to a user id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, user_id: i64) -> anyhow::Result<String>;
    async fn get(&self, session_id: &str) -> anyhow::Result<Option<i64>>;
    async fn remove(&self, session_id: &str) -> anyhow::Result<()>;
}

struct SessionEntry {
    user_id: i64,
    expires_at: OffsetDateTime,
}

/// Process-local sessions. Everything is lost on restart.
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionEntry>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Drops every expired entry, including ones whose client never came back.
    fn purge_expired(&self, now: OffsetDateTime) {
        self.sessions.retain(|_, e| e.expires_at > now);
    }
}

fn new_session_id() -> String {
    // Two v4 UUIDs, hex encoded, so the id is URL and cookie safe.
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, user_id: i64) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        self.purge_expired(now);
        let id = new_session_id();
        self.sessions.insert(
            id.clone(),
            SessionEntry {
                user_id,
                expires_at: now + self.ttl,
            },
        );
        Ok(id)
    }

    async fn get(&self, session_id: &str) -> anyhow::Result<Option<i64>> {
        let now = OffsetDateTime::now_utc();
        let found = self
            .sessions
            .get(session_id)
            .map(|e| (e.user_id, e.expires_at));
        match found {
            Some((user_id, expires_at)) if expires_at > now => Ok(Some(user_id)),
            Some(_) => {
                self.sessions.remove(session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, session_id: &str) -> anyhow::Result<()> {
        self.sessions.remove(session_id);
        Ok(())
    }
}
