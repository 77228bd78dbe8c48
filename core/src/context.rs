//! Cancellation context for blocking waits.
//!
//! A [`Context`] carries an explicit cancellation signal and an optional
//! deadline. Waits check it on every tick and give up as soon as either
//! fires, reporting which one via [`ContextError`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tele_input_core::context::{Context, ContextError};
//!
//! let parent = Context::background();
//! let child = parent.child();
//! assert!(child.err().is_none());
//!
//! parent.cancel();
//! assert_eq!(child.err(), Some(ContextError::Canceled));
//!
//! let expired = Context::background().with_timeout(Duration::ZERO);
//! assert_eq!(expired.err(), Some(ContextError::DeadlineExceeded));
//! ```

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context is done.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The context was canceled explicitly.
    #[error("context canceled")]
    Canceled,

    /// The context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation signal plus optional deadline.
///
/// Cloning shares the same signal. [`Context::child`] derives a context that
/// is canceled with its parent but can also be canceled on its own.
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never done unless canceled.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Wrap an existing cancellation token.
    #[must_use]
    pub const fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a child context canceled together with this one.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a child context that also expires at `deadline`.
    ///
    /// An earlier deadline inherited from this context is kept.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Derive a child context that expires after `timeout`.
    ///
    /// A timeout too large to represent as an instant sets no deadline.
    #[must_use]
    pub fn with_timeout(&self, timeout: std::time::Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.child(),
        }
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Deadline of this context, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, `None` while it is still live.
    ///
    /// Explicit cancellation is reported even if the deadline has also passed.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the context is done and report why.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => ContextError::Canceled,
                    () = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                ContextError::Canceled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn background_is_live() {
        assert!(Context::background().err().is_none());
    }

    #[test]
    fn cancel_propagates_to_children_only() {
        let parent = Context::background();
        let child = parent.child();
        child.cancel();
        assert_eq!(child.err(), Some(ContextError::Canceled));
        assert!(parent.err().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_deadline_is_inherited() {
        let parent = Context::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(10));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn unrepresentable_timeout_sets_no_deadline() {
        let ctx = Context::background().with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert!(ctx.err().is_none());

        let bounded = Context::background().with_timeout(Duration::from_secs(1));
        assert_eq!(bounded.with_timeout(Duration::MAX).deadline(), bounded.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn done_reports_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_millis(250));
        assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn done_reports_cancellation() {
        let ctx = Context::background();
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.done().await });
        ctx.cancel();
        assert_eq!(handle.await.ok(), Some(ContextError::Canceled));
    }

    #[test]
    fn pending_done_future_stays_pending_while_live() {
        let ctx = Context::background();
        let mut done = tokio_test::task::spawn(ctx.done());
        tokio_test::assert_pending!(done.poll());
        ctx.cancel();
        assert!(done.is_woken());
        tokio_test::assert_ready_eq!(done.poll(), ContextError::Canceled);
    }
}
