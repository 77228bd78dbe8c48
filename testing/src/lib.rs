//! # Tele Input Testing
//!
//! Testing utilities and helpers for the tele-input correlation engine.
//!
//! This crate provides:
//! - Mock collaborators ([`RecordingBot`], [`FailingStateStore`])
//! - Builders for inbound updates ([`fixtures`])
//! - A harness wiring an engine to the mocks ([`InputHarness`])
//!
//! ## Example
//!
//! ```ignore
//! use tele_input_testing::InputHarness;
//!
//! #[tokio::test]
//! async fn asks_for_a_name() {
//!     let harness = InputHarness::new();
//!     let wait = harness.spawn_wait(user, Duration::ZERO, Vec::<&str>::new()).await;
//!     harness.say(user, "Alice").await;
//!     assert_eq!(wait.await.unwrap().unwrap().text(), Some("Alice"));
//! }
//! ```

use chrono::{DateTime, Utc};

/// Builders for inbound updates
pub mod fixtures;

/// Engine wired to mock collaborators
pub mod harness;

/// Mock collaborators
pub mod mocks;

pub use harness::{InputHarness, TEST_POLL_INTERVAL};
pub use mocks::{FailingStateStore, RecordingBot};

/// Fixed timestamp stamped on every fixture message (2025-01-01 00:00:00 UTC).
#[must_use]
pub fn test_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_735_689_600, 0).unwrap_or_default()
}

/// Install a `tracing` subscriber honouring `RUST_LOG`, once per process.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_is_stable() {
        assert_eq!(test_time(), test_time());
        assert_eq!(test_time().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }
}
