//! Per-user registry of pending requests.
//!
//! Backed by a sharded [`DashMap`], so operations on different users never
//! contend on a common lock and each operation on one user is atomic.

use crate::pending::PendingRequest;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::Duration;
use tele_input_core::UserId;

/// Mapping from user identity to that user's current pending request.
#[derive(Debug, Default)]
pub struct Registry {
    requests: DashMap<UserId, Arc<PendingRequest>>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the user's request, inserting an empty one if there is none.
    ///
    /// The flag is `true` when the request was created by this call.
    pub fn get_or_create(&self, user: UserId) -> (Arc<PendingRequest>, bool) {
        match self.requests.entry(user) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
            Entry::Vacant(entry) => {
                let request = Arc::new(PendingRequest::new([], Duration::ZERO));
                entry.insert(Arc::clone(&request));
                (request, true)
            }
        }
    }

    /// Current request for `user`, if any.
    #[must_use]
    pub fn get(&self, user: UserId) -> Option<Arc<PendingRequest>> {
        self.requests.get(&user).map(|entry| Arc::clone(entry.value()))
    }

    /// Register `request` for `user`, returning the request it replaced.
    pub fn store(&self, user: UserId, request: Arc<PendingRequest>) -> Option<Arc<PendingRequest>> {
        self.requests.insert(user, request)
    }

    /// Remove whatever request `user` has.
    pub fn remove(&self, user: UserId) -> Option<Arc<PendingRequest>> {
        self.requests.remove(&user).map(|(_, request)| request)
    }

    /// Remove the entry for `user` only if it is still `request`.
    ///
    /// Returns `true` if the entry was removed. A request that has been
    /// replaced by a newer one leaves the newer one in place.
    pub fn remove_if_current(&self, user: UserId, request: &Arc<PendingRequest>) -> bool {
        self.requests
            .remove_if(&user, |_, current| Arc::ptr_eq(current, request))
            .is_some()
    }

    /// Whether `user` has a registered request.
    #[must_use]
    pub fn contains(&self, user: UserId) -> bool {
        self.requests.contains_key(&user)
    }

    /// Number of registered requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether no request is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Arc<PendingRequest> {
        Arc::new(PendingRequest::new([], Duration::from_secs(5)))
    }

    #[test]
    fn get_or_create_inserts_once() {
        let registry = Registry::new();
        let user = UserId::new(1);

        let (first, created) = registry.get_or_create(user);
        assert!(created);
        let (second, created) = registry.get_or_create(user);
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn get_or_create_returns_stored_request_unchanged() {
        let registry = Registry::new();
        let user = UserId::new(2);
        let stored = request();
        registry.store(user, Arc::clone(&stored));

        let (found, created) = registry.get_or_create(user);
        assert!(!created);
        assert!(Arc::ptr_eq(&found, &stored));
        assert_eq!(found.expiration(), Duration::from_secs(5));
    }

    #[test]
    fn store_overwrites_and_returns_previous() {
        let registry = Registry::new();
        let user = UserId::new(3);
        let old = request();
        let new = request();

        assert!(registry.store(user, Arc::clone(&old)).is_none());
        let replaced = registry.store(user, Arc::clone(&new));
        assert!(replaced.is_some_and(|r| Arc::ptr_eq(&r, &old)));
        assert!(registry.get(user).is_some_and(|r| Arc::ptr_eq(&r, &new)));
    }

    #[test]
    fn remove_if_current_keeps_newer_request() {
        let registry = Registry::new();
        let user = UserId::new(4);
        let old = request();
        let new = request();
        registry.store(user, Arc::clone(&old));
        registry.store(user, Arc::clone(&new));

        assert!(!registry.remove_if_current(user, &old));
        assert!(registry.contains(user));
        assert!(registry.remove_if_current(user, &new));
        assert!(registry.is_empty());
    }

    #[test]
    fn users_are_independent() {
        let registry = Registry::new();
        registry.store(UserId::new(5), request());
        registry.store(UserId::new(6), request());

        assert!(registry.remove(UserId::new(5)).is_some());
        assert!(registry.remove(UserId::new(5)).is_none());
        assert!(registry.contains(UserId::new(6)));
    }
}
