//! Conversation store.
//!
//! Sessions live in a `DashMap` keyed by session id. Each conversation sits
//! behind its own async mutex: a chat request holds it from the user turn to
//! the assistant turn, so requests to the same session serialize while
//! different sessions never contend.
//!
//! The map is bounded. When it grows past capacity, the least recently used
//! session is evicted, and sessions idle past the TTL are dropped by
//! [`SessionStore::evict_idle`]. A session whose handle is still held by a
//! request is never evicted, so the bound is soft while every session is busy.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::llm::{Message, Role};

/// Session id used when a request does not name one.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Shared, lockable handle to one session's conversation.
pub type SessionHandle = Arc<Mutex<Conversation>>;

/// Append-only list of turns.
#[derive(Debug, Clone)]
pub struct Conversation {
    turns: Vec<Message>,
}

impl Conversation {
    /// A new conversation holding only the system prompt.
    pub fn new(system_prompt: &str) -> Self {
        Self {
            turns: vec![Message::new(Role::System, system_prompt)],
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Message::new(role, content));
    }

    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Bounds on the number and lifetime of sessions.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub capacity: usize,
    /// `None` keeps idle sessions until capacity forces them out.
    pub idle_ttl: Option<Duration>,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            capacity: 1024,
            idle_ttl: Some(Duration::from_secs(3600)),
        }
    }
}

struct SessionEntry {
    conversation: SessionHandle,
    /// Milliseconds since the store's epoch.
    last_used: AtomicU64,
}

struct Inner {
    sessions: DashMap<String, SessionEntry>,
    system_prompt: String,
    limits: SessionLimits,
    epoch: Instant,
}

/// Process-wide session store. Cheap to clone.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    pub fn new(system_prompt: impl Into<String>, limits: SessionLimits) -> Self {
        Self {
            inner: Arc::new(Inner {
                sessions: DashMap::new(),
                system_prompt: system_prompt.into(),
                limits: SessionLimits {
                    capacity: limits.capacity.max(1),
                    ..limits
                },
                epoch: Instant::now(),
            }),
        }
    }

    /// Return the session's conversation, creating it with the system prompt
    /// if it does not exist yet.
    pub fn get_or_create(&self, session_id: &str) -> SessionHandle {
        let now = self.now_ms();
        if let Some(entry) = self.inner.sessions.get(session_id) {
            entry.last_used.store(now, Ordering::Relaxed);
            return entry.conversation.clone();
        }

        // Another request may have created it between the lookup and here.
        let handle = {
            let entry = self
                .inner
                .sessions
                .entry(session_id.to_string())
                .or_insert_with(|| {
                    debug!(session = %session_id, "creating session");
                    SessionEntry {
                        conversation: Arc::new(Mutex::new(Conversation::new(
                            &self.inner.system_prompt,
                        ))),
                        last_used: AtomicU64::new(now),
                    }
                });
            entry.last_used.store(now, Ordering::Relaxed);
            entry.conversation.clone()
        };

        // The shard guard must be released before evicting. The returned
        // handle is held, so the new session itself is never chosen.
        while self.inner.sessions.len() > self.inner.limits.capacity {
            if !self.evict_lru() {
                break;
            }
        }
        handle
    }

    /// Return an existing session without creating one.
    pub fn get(&self, session_id: &str) -> Option<SessionHandle> {
        let entry = self.inner.sessions.get(session_id)?;
        entry.last_used.store(self.now_ms(), Ordering::Relaxed);
        Some(entry.conversation.clone())
    }

    /// Append a turn, creating the session first if needed.
    pub async fn append(&self, session_id: &str, role: Role, content: impl Into<String>) {
        let handle = self.get_or_create(session_id);
        handle.lock().await.push(role, content);
    }

    /// Remove a session. Returns whether it existed.
    pub fn clear(&self, session_id: &str) -> bool {
        self.inner.sessions.remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.sessions.is_empty()
    }

    /// Drop sessions idle longer than the configured TTL. Returns how many were removed.
    pub fn evict_idle(&self) -> usize {
        let Some(ttl) = self.inner.limits.idle_ttl else {
            return 0;
        };
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let now = self.now_ms();

        let before = self.inner.sessions.len();
        self.inner.sessions.retain(|_, entry| {
            in_use(entry) || now.saturating_sub(entry.last_used.load(Ordering::Relaxed)) < ttl_ms
        });
        before.saturating_sub(self.inner.sessions.len())
    }

    /// Evict the least recently used session nobody holds. Returns false when
    /// every session is in use.
    fn evict_lru(&self) -> bool {
        // Collect first: removing while iterating would deadlock the shard.
        let oldest = self
            .inner
            .sessions
            .iter()
            .filter(|entry| !in_use(entry.value()))
            .min_by_key(|entry| entry.last_used.load(Ordering::Relaxed))
            .map(|entry| entry.key().clone());

        let Some(session_id) = oldest else {
            return false;
        };
        // Re-check under the shard lock: a request may have picked it up since.
        if self
            .inner
            .sessions
            .remove_if(&session_id, |_, entry| !in_use(entry))
            .is_some()
        {
            debug!(session = %session_id, "evicted least recently used session");
        }
        true
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.inner.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// A handle outside the map means a request is working on the session.
fn in_use(entry: &SessionEntry) -> bool {
    Arc::strong_count(&entry.conversation) > 1
}

/// Spawn a periodic idle-session sweep. Returns its handle for shutdown.
pub fn spawn_eviction_task(
    store: SessionStore,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);
        loop {
            interval.tick().await;
            let evicted = store.evict_idle();
            if evicted > 0 {
                info!(evicted, remaining = store.len(), "Evicted idle sessions");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT: &str = "You are a helpful assistant.";

    fn store() -> SessionStore {
        SessionStore::new(PROMPT, SessionLimits::default())
    }

    #[tokio::test]
    async fn new_session_has_only_system_turn() {
        let store = store();
        let handle = store.get_or_create("s1");
        let conversation = handle.lock().await;
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.turns()[0], Message::new(Role::System, PROMPT));
    }

    #[test]
    fn get_or_create_returns_same_handle() {
        let store = store();
        let first = store.get_or_create("s1");
        let second = store.get_or_create("s1");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn turns_are_kept_in_call_order() {
        let store = store();
        for i in 0..3 {
            store.append("s1", Role::User, format!("question {i}")).await;
            store.append("s1", Role::Assistant, format!("answer {i}")).await;
        }

        let handle = store.get("s1").unwrap();
        let conversation = handle.lock().await;
        assert_eq!(conversation.len(), 1 + 2 * 3);
        let contents: Vec<_> = conversation.turns()[1..]
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            ["question 0", "answer 0", "question 1", "answer 1", "question 2", "answer 2"]
        );
        assert_eq!(conversation.turns()[5].role, Role::User);
    }

    #[tokio::test]
    async fn clear_removes_history() {
        let store = store();
        store.append("s1", Role::User, "hello").await;

        assert!(store.clear("s1"));
        assert!(store.get("s1").is_none());

        let fresh = store.get_or_create("s1");
        assert_eq!(fresh.lock().await.len(), 1);
    }

    #[test]
    fn clear_unknown_session() {
        let store = store();
        store.get_or_create("other");
        assert!(!store.clear("missing"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let store = SessionStore::new(
            PROMPT,
            SessionLimits {
                capacity: 2,
                idle_ttl: None,
            },
        );
        store.get_or_create("a");
        std::thread::sleep(Duration::from_millis(5));
        store.get_or_create("b");
        std::thread::sleep(Duration::from_millis(5));
        // Touch "a" so "b" becomes the oldest.
        store.get_or_create("a");
        std::thread::sleep(Duration::from_millis(5));
        store.get_or_create("c");

        assert_eq!(store.len(), 2);
        assert!(store.get("a").is_some());
        assert!(store.get("b").is_none());
        assert!(store.get("c").is_some());
    }

    #[test]
    fn idle_sessions_are_evicted() {
        let store = SessionStore::new(
            PROMPT,
            SessionLimits {
                capacity: 10,
                idle_ttl: Some(Duration::from_millis(20)),
            },
        );
        store.get_or_create("stale");
        std::thread::sleep(Duration::from_millis(40));
        store.get_or_create("fresh");

        assert_eq!(store.evict_idle(), 1);
        assert!(store.get("stale").is_none());
        assert!(store.get("fresh").is_some());
    }

    #[test]
    fn no_ttl_keeps_idle_sessions() {
        let store = SessionStore::new(
            PROMPT,
            SessionLimits {
                capacity: 10,
                idle_ttl: None,
            },
        );
        store.get_or_create("a");
        assert_eq!(store.evict_idle(), 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn capacity_skips_sessions_in_use() {
        let store = SessionStore::new(
            PROMPT,
            SessionLimits {
                capacity: 2,
                idle_ttl: None,
            },
        );
        let held = store.get_or_create("a");
        let guard = held.lock().await;
        std::thread::sleep(Duration::from_millis(5));
        store.get_or_create("b");
        std::thread::sleep(Duration::from_millis(5));
        store.get_or_create("c");

        // "a" is the oldest but busy, so "b" goes instead.
        assert_eq!(store.len(), 2);
        assert!(store.get("b").is_none());

        let again = store.get_or_create("a");
        assert!(Arc::ptr_eq(&held, &again));
        assert!(again.try_lock().is_err());
        drop(guard);
    }

    #[test]
    fn capacity_is_exceeded_only_while_all_sessions_are_held() {
        let store = SessionStore::new(
            PROMPT,
            SessionLimits {
                capacity: 1,
                idle_ttl: None,
            },
        );
        let a = store.get_or_create("a");
        let b = store.get_or_create("b");
        assert_eq!(store.len(), 2);

        drop(a);
        drop(b);
        store.get_or_create("c");
        assert_eq!(store.len(), 1);
        assert!(store.get("c").is_some());
    }

    #[tokio::test]
    async fn idle_sweep_skips_sessions_in_use() {
        let store = SessionStore::new(
            PROMPT,
            SessionLimits {
                capacity: 10,
                idle_ttl: Some(Duration::from_millis(20)),
            },
        );
        let held = store.get_or_create("busy");
        let _guard = held.lock().await;
        store.get_or_create("stale");
        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(store.evict_idle(), 1);
        let again = store.get("busy").unwrap();
        assert!(Arc::ptr_eq(&held, &again));
        assert!(store.get("stale").is_none());
    }

    #[tokio::test]
    async fn concurrent_appends_to_one_session_are_serialized() {
        let store = store();
        let mut tasks = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let handle = store.get_or_create("shared");
                let mut conversation = handle.lock().await;
                conversation.push(Role::User, format!("q{i}"));
                tokio::task::yield_now().await;
                conversation.push(Role::Assistant, format!("a{i}"));
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let handle = store.get("shared").unwrap();
        let conversation = handle.lock().await;
        assert_eq!(conversation.len(), 41);
        for pair in conversation.turns()[1..].chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
            assert_eq!(pair[0].content[1..], pair[1].content[1..]);
        }
    }
}
