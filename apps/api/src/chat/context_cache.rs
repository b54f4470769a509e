//! Context Cache — bounded-lifetime map from (user, session) to a live model
//! conversation handle.
//!
//! Handles are expensive to carry but cheap to rebuild: a miss replays the
//! most recent history suffix through `ModelService::start_conversation`.
//! Eviction therefore only ever drops the handle — the persisted session is
//! the source of truth and survives process restarts untouched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::llm_client::{LlmError, ModelConversation, ModelService};
use crate::models::session::ChatTurn;

/// Most recent history turns replayed when a handle is rebuilt. Bounds the
/// reconstructed context size for long sessions.
pub const CONTEXT_REPLAY_TURNS: usize = 20;
/// Idle lifetime before the sweep drops a handle.
const CONTEXT_TTL: Duration = Duration::from_secs(30 * 60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub type SharedConversation = Arc<tokio::sync::Mutex<Box<dyn ModelConversation>>>;

struct CacheEntry {
    handle: SharedConversation,
    last_accessed: Instant,
}

/// Shared across all sessions; every mutation happens under the interior
/// mutex, which is never held across an await.
#[derive(Default)]
pub struct ContextCache {
    entries: Mutex<HashMap<(Uuid, Uuid), CacheEntry>>,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached handle for `(user_id, session_id)` if it is still
    /// within TTL (refreshing its timestamp), otherwise reconstructs one from
    /// the bounded history suffix and caches it.
    pub async fn get_or_create(
        &self,
        model: &dyn ModelService,
        user_id: Uuid,
        session_id: Uuid,
        history: &[ChatTurn],
    ) -> Result<SharedConversation, LlmError> {
        let key = (user_id, session_id);

        let hit = {
            let mut entries = self.entries.lock().unwrap();
            entries.get_mut(&key).and_then(|entry| {
                if entry.last_accessed.elapsed() < CONTEXT_TTL {
                    entry.last_accessed = Instant::now();
                    Some(entry.handle.clone())
                } else {
                    None
                }
            })
        };
        if let Some(handle) = hit {
            return Ok(handle);
        }

        let replay_from = history.len().saturating_sub(CONTEXT_REPLAY_TURNS);
        debug!(
            "Rebuilding conversation context for session {session_id} from {} history turns",
            history.len() - replay_from
        );
        let handle: SharedConversation = Arc::new(tokio::sync::Mutex::new(
            model.start_conversation(&history[replay_from..]).await?,
        ));

        self.entries.lock().unwrap().insert(
            key,
            CacheEntry {
                handle: handle.clone(),
                last_accessed: Instant::now(),
            },
        );

        Ok(handle)
    }

    /// Drops the handle for one session. Called after a failed turn so the
    /// next attempt rebuilds from persisted history instead of reusing a
    /// handle that saw turns which were never committed.
    pub fn invalidate(&self, user_id: Uuid, session_id: Uuid) {
        self.entries.lock().unwrap().remove(&(user_id, session_id));
    }

    /// Removes every entry idle past TTL. Returns how many were dropped.
    pub fn evict_stale(&self) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| entry.last_accessed.elapsed() < CONTEXT_TTL);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Periodic eviction sweep on its own task, decoupled from request
    /// handling.
    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                let evicted = self.evict_stale();
                if evicted > 0 {
                    info!("Context sweep evicted {evicted} idle conversation handle(s)");
                }
            }
        })
    }

    /// Backdates an entry so eviction paths are testable without waiting out
    /// the TTL.
    #[cfg(test)]
    pub fn age_entry(&self, user_id: Uuid, session_id: Uuid, by: Duration) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(&(user_id, session_id)) {
            if let Some(backdated) = entry.last_accessed.checked_sub(by) {
                entry.last_accessed = backdated;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::test_support::ScriptedModel;

    fn turns(n: usize) -> Vec<ChatTurn> {
        (0..n).map(|i| ChatTurn::user(format!("turn {i}"))).collect()
    }

    #[tokio::test]
    async fn miss_reconstructs_from_bounded_history_suffix() {
        let cache = ContextCache::new();
        let model = ScriptedModel::new(vec![]);
        let user = Uuid::new_v4();
        let session = Uuid::new_v4();

        let history = turns(50);
        cache
            .get_or_create(&*model, user, session, &history)
            .await
            .unwrap();

        assert_eq!(model.replayed_turn_counts(), vec![CONTEXT_REPLAY_TURNS]);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn hit_reuses_handle_without_replaying() {
        let cache = ContextCache::new();
        let model = ScriptedModel::new(vec![]);
        let user = Uuid::new_v4();
        let session = Uuid::new_v4();
        let history = turns(4);

        let first = cache
            .get_or_create(&*model, user, session, &history)
            .await
            .unwrap();
        let second = cache
            .get_or_create(&*model, user, session, &history)
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(model.replayed_turn_counts(), vec![4]); // one reconstruction only
    }

    #[tokio::test]
    async fn stale_entry_is_swept_then_rebuilt() {
        let cache = ContextCache::new();
        let model = ScriptedModel::new(vec![]);
        let user = Uuid::new_v4();
        let session = Uuid::new_v4();
        let history = turns(2);

        cache
            .get_or_create(&*model, user, session, &history)
            .await
            .unwrap();
        cache.age_entry(user, session, CONTEXT_TTL + Duration::from_secs(1));

        assert_eq!(cache.evict_stale(), 1);
        assert!(cache.is_empty());

        // A later turn still succeeds — the handle is simply rebuilt.
        cache
            .get_or_create(&*model, user, session, &history)
            .await
            .unwrap();
        assert_eq!(model.replayed_turn_counts(), vec![2, 2]);
    }

    #[tokio::test]
    async fn cache_is_keyed_per_user_and_session() {
        let cache = ContextCache::new();
        let model = ScriptedModel::new(vec![]);
        let session = Uuid::new_v4();
        let history = turns(1);

        let a = cache
            .get_or_create(&*model, Uuid::new_v4(), session, &history)
            .await
            .unwrap();
        let b = cache
            .get_or_create(&*model, Uuid::new_v4(), session, &history)
            .await
            .unwrap();

        // Same session id, different users: never shared.
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn invalidate_drops_only_the_target_entry() {
        let cache = ContextCache::new();
        let model = ScriptedModel::new(vec![]);
        let user = Uuid::new_v4();
        let s1 = Uuid::new_v4();
        let s2 = Uuid::new_v4();
        let history = turns(1);

        cache.get_or_create(&*model, user, s1, &history).await.unwrap();
        cache.get_or_create(&*model, user, s2, &history).await.unwrap();

        cache.invalidate(user, s1);
        assert_eq!(cache.len(), 1);
    }
}
