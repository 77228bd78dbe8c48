//! Per-user state storage contract.
//!
//! The engine flags users with an outstanding wait by writing a marker into a
//! [`StateStore`]. Inbound handlers read the marker as a cheap existence
//! filter before touching the pending request registry.
//!
//! The store is never the source of truth for a wait: a missing, stale or
//! unreadable marker only makes inbound handlers ignore the event.
//!
//! # Implementations
//!
//! - `MemoryStateStore` (in `tele-input-runtime`): default, in-process, honours expiration
//! - `FailingStateStore` (in `tele-input-testing`): injects failures in tests

use crate::BoxFuture;
use crate::update::UserId;
use std::time::Duration;
use thiserror::Error;

/// Marker written for users with an outstanding wait.
pub const WAITING_INPUT: &str = "waiting_input";

/// Errors returned by state store backends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateStoreError {
    /// The backend rejected or failed the operation.
    #[error("State store backend error: {0}")]
    Backend(String),

    /// The backend could not be reached.
    #[error("State store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value store mapping user identity to a state marker.
///
/// # Consistency
///
/// Implementations must provide read-after-write consistency per key within
/// a single process. Nothing else is assumed.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so the engine can hold an
/// `Arc<dyn StateStore>` chosen at runtime.
pub trait StateStore: Send + Sync {
    /// Store `state` for `user`.
    ///
    /// `expiration` is a hint: stores that support TTLs should drop the entry
    /// after it elapses, others may ignore it. [`Duration::ZERO`] means the
    /// entry never expires.
    ///
    /// # Errors
    ///
    /// Returns [`StateStoreError`] if the backend cannot persist the entry.
    fn set(
        &self,
        user: UserId,
        state: &str,
        expiration: Duration,
    ) -> BoxFuture<'_, Result<(), StateStoreError>>;

    /// Load the state for `user`, `None` when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StateStoreError`] if the backend cannot be read.
    fn get(&self, user: UserId) -> BoxFuture<'_, Result<Option<String>, StateStoreError>>;

    /// Remove the state for `user`. Missing entries are not an error.
    fn delete(&self, user: UserId) -> BoxFuture<'_, ()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_display() {
        let error = StateStoreError::Backend("write refused".to_string());
        assert_eq!(error.to_string(), "State store backend error: write refused");
    }

    #[test]
    fn unavailable_error_display() {
        let error = StateStoreError::Unavailable("connection reset".to_string());
        assert!(error.to_string().contains("connection reset"));
    }
}
