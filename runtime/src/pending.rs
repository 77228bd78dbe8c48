//! A single outstanding wait for one user.
//!
//! A [`PendingRequest`] moves through one transition only:
//!
//! ```text
//! waiting ──► completed (message | callback)
//!    │
//!    └──────► completed + canceled
//! ```
//!
//! Once completed by an inbound event it is immutable, except that an
//! explicit cancel still raises the canceled flag. All fields live behind
//! one mutex; every critical section is a handful of assignments.

use smallvec::SmallVec;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tele_input_core::{Callback, Discriminator, Message};
use tokio::sync::Notify;
use tokio::sync::futures::Notified;

/// Outcome of a completed wait.
///
/// A text message completion sets only `message`. A button press sets
/// `callback` and, when known, `message` to the message the button was
/// attached to. An explicit cancel sets `canceled`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Response {
    /// The captured message, if any
    pub message: Option<Message>,
    /// The captured button press, if any
    pub callback: Option<Callback>,
    /// Whether the wait was canceled through `InputManager::cancel`
    pub canceled: bool,
}

impl Response {
    /// Whether the wait was completed by a button press.
    #[must_use]
    pub const fn is_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Text of the captured message, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.text.as_str())
    }
}

#[derive(Debug, Default)]
struct PendingState {
    message: Option<Message>,
    callback: Option<Callback>,
    completed: bool,
    canceled: bool,
}

/// One outstanding wait, shared between its waiter and the inbound handlers.
#[derive(Debug)]
pub struct PendingRequest {
    endpoints: SmallVec<[Discriminator; 4]>,
    expiration: Duration,
    state: Mutex<PendingState>,
    notify: Notify,
}

impl PendingRequest {
    /// Create a waiting request accepting the given buttons.
    ///
    /// `expiration` is the wait's timeout, kept so the state store marker can
    /// be rewritten with the same hint.
    #[must_use]
    pub fn new(endpoints: impl IntoIterator<Item = Discriminator>, expiration: Duration) -> Self {
        Self {
            endpoints: endpoints.into_iter().collect(),
            expiration,
            state: Mutex::new(PendingState::default()),
            notify: Notify::new(),
        }
    }

    /// Buttons this wait accepts. Empty means text messages only.
    #[must_use]
    pub fn endpoints(&self) -> &[Discriminator] {
        &self.endpoints
    }

    /// Timeout the wait was registered with.
    #[must_use]
    pub const fn expiration(&self) -> Duration {
        self.expiration
    }

    /// First registered endpoint matching `discriminator`.
    ///
    /// Always `None` for waits without endpoints: button presses are never
    /// accepted as a wildcard.
    #[must_use]
    pub fn matching_endpoint(&self, discriminator: &Discriminator) -> Option<&Discriminator> {
        self.endpoints
            .iter()
            .find(|endpoint| endpoint.matches(discriminator))
    }

    /// Whether a terminal outcome has been recorded.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.lock().completed
    }

    /// Record a text message. Returns `false` if already completed.
    pub fn complete_with_message(&self, message: Message) -> bool {
        {
            let mut state = self.lock();
            if state.completed {
                return false;
            }
            state.message = Some(message);
            state.completed = true;
        }
        self.notify.notify_one();
        true
    }

    /// Record a button press together with the message it was attached to.
    /// Returns `false` if already completed.
    pub fn complete_with_callback(&self, callback: Callback) -> bool {
        {
            let mut state = self.lock();
            if state.completed {
                return false;
            }
            state.message.clone_from(&callback.message);
            state.callback = Some(callback);
            state.completed = true;
        }
        self.notify.notify_one();
        true
    }

    /// Force completion as canceled, even if an event already completed it.
    pub fn cancel(&self) {
        {
            let mut state = self.lock();
            state.canceled = true;
            state.completed = true;
        }
        self.notify.notify_one();
    }

    /// Snapshot of the outcome, `None` while still waiting.
    #[must_use]
    pub fn response(&self) -> Option<Response> {
        let state = self.lock();
        state.completed.then(|| Response {
            message: state.message.clone(),
            callback: state.callback.clone(),
            canceled: state.canceled,
        })
    }

    /// Resolves after the next state change.
    ///
    /// A change that happened with nobody listening is remembered, so the
    /// next call resolves immediately.
    pub fn changed(&self) -> Notified<'_> {
        self.notify.notified()
    }

    fn lock(&self) -> MutexGuard<'_, PendingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
