//! In-process state store, the engine's default backend.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tele_input_core::{BoxFuture, StateStore, StateStoreError, UserId};
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    state: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// `HashMap`-backed [`StateStore`] that honours expiration hints.
///
/// A hint of zero, or one too large to represent, never expires.
///
/// Expired entries read as absent. They are dropped lazily on access and
/// in bulk by [`MemoryStateStore::purge_expired`]. Operations never fail.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tele_input_core::{StateStore, UserId};
/// use tele_input_runtime::MemoryStateStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStateStore::new();
/// store.set(UserId::new(1), "waiting_input", Duration::ZERO).await?;
/// assert_eq!(store.get(UserId::new(1)).await?.as_deref(), Some("waiting_input"));
///
/// store.delete(UserId::new(1)).await;
/// assert!(store.get(UserId::new(1)).await?.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryStateStore {
    entries: Arc<RwLock<HashMap<UserId, Entry>>>,
}

impl MemoryStateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    /// Whether the store holds no live entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a live entry exists for `user`.
    #[must_use]
    pub fn contains(&self, user: UserId) -> bool {
        self.lookup(user).is_some()
    }

    fn lookup(&self, user: UserId) -> Option<String> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(&user) {
                None => return None,
                Some(entry) if entry.is_live(now) => return Some(entry.state.clone()),
                Some(_) => {}
            }
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.get(&user).is_some_and(|entry| !entry.is_live(now)) {
            entries.remove(&user);
        }
        None
    }
}

impl StateStore for MemoryStateStore {
    fn set(
        &self,
        user: UserId,
        state: &str,
        expiration: Duration,
    ) -> BoxFuture<'_, Result<(), StateStoreError>> {
        let entry = Entry {
            state: state.to_string(),
            expires_at: if expiration.is_zero() {
                None
            } else {
                Instant::now().checked_add(expiration)
            },
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user, entry);
        Box::pin(async { Ok(()) })
    }

    fn get(&self, user: UserId) -> BoxFuture<'_, Result<Option<String>, StateStoreError>> {
        let state = self.lookup(user);
        Box::pin(async move { Ok(state) })
    }

    fn delete(&self, user: UserId) -> BoxFuture<'_, ()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user);
        Box::pin(async {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_user_reads_none() {
        let store = MemoryStateStore::new();
        assert_eq!(store.get(UserId::new(1)).await, Ok(None));
    }

    #[tokio::test]
    async fn set_overwrites() {
        let store = MemoryStateStore::new();
        let user = UserId::new(2);
        store.set(user, "a", Duration::ZERO).await.ok();
        store.set(user, "b", Duration::ZERO).await.ok();
        assert_eq!(store.get(user).await, Ok(Some("b".to_string())));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_hint() {
        let store = MemoryStateStore::new();
        let user = UserId::new(3);
        store.set(user, "waiting_input", Duration::from_secs(2)).await.ok();

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(store.contains(user));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get(user).await, Ok(None));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_only_expired() {
        let store = MemoryStateStore::new();
        store.set(UserId::new(4), "x", Duration::from_millis(10)).await.ok();
        store.set(UserId::new(5), "y", Duration::ZERO).await.ok();

        tokio::time::advance(Duration::from_millis(20)).await;
        assert_eq!(store.purge_expired(), 1);
        assert!(store.contains(UserId::new(5)));
    }

    #[tokio::test]
    async fn unrepresentable_expiration_never_expires() {
        let store = MemoryStateStore::new();
        let user = UserId::new(7);
        store.set(user, "waiting_input", Duration::MAX).await.ok();
        assert_eq!(store.purge_expired(), 0);
        assert_eq!(store.get(user).await, Ok(Some("waiting_input".to_string())));
    }

    #[tokio::test]
    async fn delete_missing_is_noop() {
        let store = MemoryStateStore::new();
        store.delete(UserId::new(6)).await;
        assert!(store.is_empty());
    }
}
