//! Mock collaborators for engine tests.
//!
//! - [`RecordingBot`]: records every outbound call, can be told to fail
//! - [`FailingStateStore`]: wraps a real store and injects failures

#![allow(clippy::missing_panics_doc)] // Poisoned locks only happen after a test already panicked

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tele_input_core::{
    BotApi, BotError, BoxFuture, Callback, ChatId, Message, StateStore, StateStoreError, UserId,
};
use tele_input_runtime::MemoryStateStore;

/// Bot double that records every call.
///
/// Sent messages get increasing ids starting at 1000 and the bot's own user
/// id as sender.
///
/// # Example
///
/// ```
/// use tele_input_core::{BotApi, ChatId};
/// use tele_input_testing::RecordingBot;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bot = RecordingBot::new();
/// let sent = bot.send_text(ChatId::new(1), "Hi").await?;
/// bot.delete_message(&sent).await?;
/// assert_eq!(bot.deleted_ids(), vec![sent.id]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RecordingBot {
    user: UserId,
    next_id: AtomicI64,
    now: DateTime<Utc>,
    answered: Mutex<Vec<String>>,
    sent: Mutex<Vec<Message>>,
    deleted: Mutex<Vec<i64>>,
    fail_answers: AtomicBool,
    fail_deletes_of: Mutex<Vec<i64>>,
}

impl Default for RecordingBot {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBot {
    /// Create a bot that succeeds at everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            user: UserId::new(1),
            next_id: AtomicI64::new(1000),
            now: crate::test_time(),
            answered: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            fail_answers: AtomicBool::new(false),
            fail_deletes_of: Mutex::new(Vec::new()),
        }
    }

    /// Make every callback acknowledgement fail.
    pub fn fail_answers(&self) {
        self.fail_answers.store(true, Ordering::SeqCst);
    }

    /// Make deleting the message with `id` fail.
    pub fn fail_delete_of(&self, id: i64) {
        lock(&self.fail_deletes_of).push(id);
    }

    /// Ids of acknowledged callbacks, in order.
    #[must_use]
    pub fn answered_ids(&self) -> Vec<String> {
        lock(&self.answered).clone()
    }

    /// Messages sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Message> {
        lock(&self.sent).clone()
    }

    /// Ids of successfully deleted messages, in order.
    #[must_use]
    pub fn deleted_ids(&self) -> Vec<i64> {
        lock(&self.deleted).clone()
    }
}

impl BotApi for RecordingBot {
    fn answer_callback<'a>(&'a self, callback: &'a Callback) -> BoxFuture<'a, Result<(), BotError>> {
        Box::pin(async move {
            if self.fail_answers.load(Ordering::SeqCst) {
                return Err(BotError::Api {
                    code: 400,
                    description: "query is too old".to_string(),
                });
            }
            lock(&self.answered).push(callback.id.clone());
            Ok(())
        })
    }

    fn send_text<'a>(&'a self, chat: ChatId, text: &'a str) -> BoxFuture<'a, Result<Message, BotError>> {
        Box::pin(async move {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let message = Message::new(id, chat, self.user, text, self.now);
            lock(&self.sent).push(message.clone());
            Ok(message)
        })
    }

    fn delete_message<'a>(&'a self, message: &'a Message) -> BoxFuture<'a, Result<(), BotError>> {
        Box::pin(async move {
            if lock(&self.fail_deletes_of).contains(&message.id) {
                return Err(BotError::Api {
                    code: 400,
                    description: "message to delete not found".to_string(),
                });
            }
            lock(&self.deleted).push(message.id);
            Ok(())
        })
    }
}

/// State store double that can be switched into failure modes or slowed down.
///
/// Delegates to a [`MemoryStateStore`] while healthy.
#[derive(Debug, Clone, Default)]
pub struct FailingStateStore {
    inner: MemoryStateStore,
    fail_writes: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
    write_delay_ms: Arc<AtomicU64>,
}

impl FailingStateStore {
    /// Healthy store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose writes fail.
    #[must_use]
    pub fn failing_writes() -> Self {
        let store = Self::default();
        store.set_fail_writes(true);
        store
    }

    /// Toggle write failures.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Toggle read failures.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Hold every write back by `delay` before it reaches the wrapped store.
    pub fn set_write_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.write_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// The wrapped store, for inspecting what was written.
    #[must_use]
    pub const fn inner(&self) -> &MemoryStateStore {
        &self.inner
    }
}

impl StateStore for FailingStateStore {
    fn set(
        &self,
        user: UserId,
        state: &str,
        expiration: Duration,
    ) -> BoxFuture<'_, Result<(), StateStoreError>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Box::pin(async {
                Err(StateStoreError::Unavailable("injected write failure".to_string()))
            });
        }
        let delay = Duration::from_millis(self.write_delay_ms.load(Ordering::SeqCst));
        if delay.is_zero() {
            return self.inner.set(user, state, expiration);
        }
        let state = state.to_string();
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            self.inner.set(user, &state, expiration).await
        })
    }

    fn get(&self, user: UserId) -> BoxFuture<'_, Result<Option<String>, StateStoreError>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Box::pin(async {
                Err(StateStoreError::Backend("injected read failure".to_string()))
            });
        }
        self.inner.get(user)
    }

    fn delete(&self, user: UserId) -> BoxFuture<'_, ()> {
        self.inner.delete(user)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
