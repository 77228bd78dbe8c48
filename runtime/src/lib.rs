//! # Tele Input Runtime
//!
//! The correlation engine that hands the next matching bot update to a
//! request waiting for it.
//!
//! ## Core Components
//!
//! - **`InputManager`**: registers waits, runs the inbound handlers, cancels
//! - **`Registry`**: per-user map of outstanding waits
//! - **`PendingRequest`**: one outstanding wait and its outcome
//! - **`MemoryStateStore`**: default in-process marker store
//! - **`MessageCollector`**: deletes the messages a dialog left behind
//!
//! ## Example
//!
//! ```ignore
//! use tele_input_runtime::InputManager;
//!
//! let manager = InputManager::builder().bot(bot.clone()).build();
//!
//! // Wire the handlers into the transport's dispatch.
//! dispatcher.on_text({ let m = manager.clone(); move |msg| async move { m.handle_message(&msg).await } });
//! dispatcher.on_callback({ let m = manager.clone(); move |cb| async move { m.handle_callback(&cb).await } });
//!
//! // In a handler that needs an answer:
//! bot.send_text(chat, "What's your name?").await?;
//! let response = manager.get(&ctx, user, Duration::from_secs(60), Vec::<&str>::new()).await?;
//! ```

/// Record-then-bulk-delete helper for bot messages
pub mod collector;

/// Engine configuration
pub mod config;

/// The correlation engine
pub mod manager;

/// In-process state store
pub mod memory_store;

/// Prometheus metrics for observability
pub mod metrics;

/// Outstanding waits and their outcomes
pub mod pending;

/// Per-user registry of outstanding waits
pub mod registry;

/// Error types for the input engine
pub mod error {
    use tele_input_core::{ContextError, StateStoreError};
    use thiserror::Error;

    /// Errors returned by [`InputManager::get`](crate::InputManager::get).
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum InputError {
        /// The waiting marker could not be written
        ///
        /// The wait never started. Its registry entry has been removed.
        #[error("Failed to register wait: {0}")]
        Storage(#[from] StateStoreError),

        /// The caller's context was canceled or hit its deadline
        ///
        /// The wait is abandoned, as if canceled.
        #[error("Wait canceled: {0}")]
        Canceled(ContextError),

        /// No matching input arrived before the wait's timeout
        #[error("input timeout")]
        Timeout,
    }

    impl InputError {
        /// Whether the wait ended because the caller's context was done.
        #[must_use]
        pub const fn is_canceled(&self) -> bool {
            matches!(self, Self::Canceled(_))
        }

        /// Whether the wait timed out.
        #[must_use]
        pub const fn is_timeout(&self) -> bool {
            matches!(self, Self::Timeout)
        }
    }
}

pub use collector::{ClearOptions, MessageCollector};
pub use config::InputManagerConfig;
pub use error::InputError;
pub use manager::{InputManager, InputManagerBuilder};
pub use memory_store::MemoryStateStore;
pub use pending::{PendingRequest, Response};
pub use registry::Registry;

#[cfg(test)]
mod tests {
    use super::*;
    use tele_input_core::{ContextError, StateStoreError};

    #[test]
    fn storage_error_keeps_cause() {
        let error = InputError::from(StateStoreError::Unavailable("redis down".to_string()));
        assert!(error.to_string().contains("redis down"));
        assert!(!error.is_canceled());
    }

    #[test]
    fn canceled_reports_context_reason() {
        let error = InputError::Canceled(ContextError::DeadlineExceeded);
        assert!(error.is_canceled());
        assert!(error.to_string().contains("deadline exceeded"));
    }

    #[test]
    fn timeout_is_distinct() {
        assert!(InputError::Timeout.is_timeout());
        assert!(!InputError::Canceled(ContextError::Canceled).is_timeout());
    }
}
