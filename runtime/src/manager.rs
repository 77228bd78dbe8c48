//! The correlation engine.
//!
//! # Flow
//!
//! ```text
//!  waiter                         registry / store                 inbound handlers
//!  ──────                         ────────────────                 ────────────────
//!  get(ctx, user, timeout, btns)
//!    ├─ store PendingRequest ───► registry[user]
//!    ├─ set marker ─────────────► store[user] = "waiting_input"
//!    │                                                     ◄─── handle_message / handle_callback
//!    │                                                          ├─ marker present?
//!    │                                                          ├─ get_or_create registry[user]
//!    │                                                          ├─ match, complete, notify
//!    │                                                          └─ delete marker
//!    ├─ wait: ctx │ notify │ poll tick
//!    └─ release registry[user] + marker
//! ```
//!
//! Every exit path of [`InputManager::get`] releases the registry entry and
//! the marker, but only while they still belong to that call: a wait that
//! was canceled or superseded never tears down a newer one.

use crate::config::InputManagerConfig;
use crate::error::InputError;
use crate::memory_store::MemoryStateStore;
use crate::metrics::{InputMetrics, WaitOutcome};
use crate::pending::{PendingRequest, Response};
use crate::registry::Registry;
use std::sync::Arc;
use std::time::Duration;
use tele_input_core::{BotApi, Callback, Context, Discriminator, Message, StateStore, UserId};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Shortest poll interval the wait loop accepts.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

struct Inner {
    registry: Registry,
    store: Arc<dyn StateStore>,
    bot: Option<Arc<dyn BotApi>>,
    config: InputManagerConfig,
}

/// Correlates inbound bot updates with requests waiting for them.
///
/// Cloning is cheap and every clone shares the same registry and store, so
/// one clone can be wired into the transport's handlers while others are
/// used by the tasks that wait.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tele_input_core::{ChatId, Context, Message, UserId, Utc};
/// use tele_input_runtime::InputManager;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = InputManager::new();
/// let user = UserId::new(42);
///
/// let waiter = manager.clone();
/// let wait = tokio::spawn(async move {
///     waiter.get(&Context::background(), user, Duration::from_secs(30), Vec::<&str>::new()).await
/// });
///
/// while !manager.is_waiting(user) {
///     tokio::task::yield_now().await;
/// }
/// let reply = Message::new(1, ChatId::new(42), user, "Alice", Utc::now());
/// manager.handle_message(&reply).await;
///
/// let response = wait.await??;
/// assert_eq!(response.text(), Some("Alice"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InputManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for InputManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputManager")
            .field("pending", &self.inner.registry.len())
            .field("has_bot", &self.inner.bot.is_some())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`InputManager`].
#[derive(Default)]
pub struct InputManagerBuilder {
    config: InputManagerConfig,
    store: Option<Arc<dyn StateStore>>,
    bot: Option<Arc<dyn BotApi>>,
}

impl InputManagerBuilder {
    /// Use `config` instead of the defaults.
    #[must_use]
    pub fn config(mut self, config: InputManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `store` for waiting markers instead of a [`MemoryStateStore`].
    #[must_use]
    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Acknowledge accepted button presses through `bot`.
    #[must_use]
    pub fn bot(mut self, bot: Arc<dyn BotApi>) -> Self {
        self.bot = Some(bot);
        self
    }

    /// Build the engine.
    #[must_use]
    pub fn build(self) -> InputManager {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStateStore::new()));
        InputManager {
            inner: Arc::new(Inner {
                registry: Registry::new(),
                store,
                bot: self.bot,
                config: self.config,
            }),
        }
    }
}

impl InputManager {
    /// Engine with default configuration, an in-memory store and no bot.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Engine with default configuration backed by `store`.
    #[must_use]
    pub fn with_store(store: Arc<dyn StateStore>) -> Self {
        Self::builder().store(store).build()
    }

    /// Start configuring an engine.
    #[must_use]
    pub fn builder() -> InputManagerBuilder {
        InputManagerBuilder::default()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &InputManagerConfig {
        &self.inner.config
    }

    /// Whether `user` currently has a registered wait.
    #[must_use]
    pub fn is_waiting(&self, user: UserId) -> bool {
        self.inner.registry.contains(user)
    }

    /// Number of registered waits.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Wait for the next input from `user`.
    ///
    /// With no `endpoints`, the next text message completes the wait. With
    /// endpoints, a press of one of those buttons completes it and returns
    /// the press together with the message the button was attached to. Text
    /// messages complete such waits as well unless
    /// [`InputManagerConfig::text_completes_button_waits`] is off.
    ///
    /// A `timeout` of zero waits until an event arrives, `ctx` is done or
    /// [`cancel`](Self::cancel) is called.
    ///
    /// Issuing a new wait for a user who already has one cancels the older
    /// wait, which then returns with `canceled = true`.
    ///
    /// # Errors
    ///
    /// - [`InputError::Storage`]: the waiting marker could not be written
    /// - [`InputError::Canceled`]: `ctx` was canceled or its deadline passed
    /// - [`InputError::Timeout`]: `timeout` elapsed with no matching input
    ///
    /// Explicit cancellation is not an error: it returns `Ok` with
    /// [`Response::canceled`] set.
    #[tracing::instrument(skip_all, fields(user = %user, timeout = ?timeout))]
    pub async fn get<I>(
        &self,
        ctx: &Context,
        user: UserId,
        timeout: Duration,
        endpoints: I,
    ) -> Result<Response, InputError>
    where
        I: IntoIterator,
        I::Item: Into<Discriminator>,
    {
        let started = Instant::now();
        let request = Arc::new(PendingRequest::new(
            endpoints.into_iter().map(Into::into),
            timeout,
        ));

        if let Some(previous) = self.inner.registry.store(user, Arc::clone(&request)) {
            debug!("Superseding outstanding wait");
            previous.cancel();
        }
        InputMetrics::record_wait_started();
        InputMetrics::record_pending(self.inner.registry.len());
        debug!(endpoints = request.endpoints().len(), "Waiting for input");

        let mut guard = WaitGuard {
            manager: self,
            user,
            request: &request,
            armed: true,
        };

        if let Err(error) = self
            .inner
            .store
            .set(user, &self.inner.config.marker, timeout)
            .await
        {
            warn!(error = %error, "Failed to mark user as waiting");
            guard.release().await;
            InputMetrics::record_wait_finished(WaitOutcome::StorageError, started.elapsed());
            return Err(InputError::Storage(error));
        }

        let result = self.wait(ctx, &request, timeout, started).await;
        guard.release().await;

        let outcome = match &result {
            Ok(response) if response.canceled => WaitOutcome::Canceled,
            Ok(response) if response.is_callback() => WaitOutcome::Callback,
            Ok(_) => WaitOutcome::Message,
            Err(InputError::Timeout) => WaitOutcome::Timeout,
            Err(InputError::Canceled(_)) => WaitOutcome::ContextDone,
            Err(InputError::Storage(_)) => WaitOutcome::StorageError,
        };
        debug!(outcome = outcome.as_str(), "Wait finished");
        InputMetrics::record_wait_finished(outcome, started.elapsed());
        InputMetrics::record_pending(self.inner.registry.len());
        result
    }

    async fn wait(
        &self,
        ctx: &Context,
        request: &PendingRequest,
        timeout: Duration,
        started: Instant,
    ) -> Result<Response, InputError> {
        let poll_interval = self.inner.config.poll_interval.max(MIN_POLL_INTERVAL);
        loop {
            if let Some(error) = ctx.err() {
                return Err(InputError::Canceled(error));
            }
            if let Some(response) = request.response() {
                return Ok(response);
            }
            if !timeout.is_zero() && started.elapsed() > timeout {
                return Err(InputError::Timeout);
            }

            tokio::select! {
                _ = ctx.done() => {}
                () = request.changed() => {}
                () = tokio::time::sleep(poll_interval) => {}
            }
        }
    }

    /// Cancel the outstanding wait of `user`, if any.
    ///
    /// The waiter returns `Ok` with `canceled = true` on its next check. The
    /// registry entry and the marker are removed right away, so a wait issued
    /// after this returns starts clean.
    pub async fn cancel(&self, user: UserId) {
        let Some(request) = self.inner.registry.remove(user) else {
            trace!(user = %user, "No wait to cancel");
            return;
        };
        request.cancel();
        debug!(user = %user, "Wait canceled");
        self.clear_marker(user).await;
        InputMetrics::record_pending(self.inner.registry.len());
    }

    /// Inbound handler for text messages.
    ///
    /// Completes the sender's wait if there is one. Never fails: messages
    /// nobody waits for are left for the rest of the application.
    pub async fn handle_message(&self, message: &Message) {
        let user = message.sender;
        if !self.is_marked(user).await {
            trace!(user = %user, "Ignoring message, no wait outstanding");
            InputMetrics::record_ignored("message");
            return;
        }

        let (request, created) = self.inner.registry.get_or_create(user);
        let accepts_text =
            request.endpoints().is_empty() || self.inner.config.text_completes_button_waits;
        if accepts_text {
            if request.complete_with_message(message.clone()) {
                debug!(user = %user, message_id = message.id, "Wait completed by message");
            }
            self.clear_marker(user).await;
        } else {
            trace!(user = %user, "Ignoring message, wait expects a button");
            InputMetrics::record_ignored("message");
        }
        self.drop_orphan(user, &request, created);
    }

    /// Inbound handler for button presses.
    ///
    /// Completes the sender's wait if it registered the pressed button, and
    /// acknowledges the press. Presses never complete a wait registered
    /// without buttons. Never fails.
    pub async fn handle_callback(&self, callback: &Callback) {
        let user = callback.sender;
        if !self.is_marked(user).await {
            trace!(user = %user, "Ignoring callback, no wait outstanding");
            InputMetrics::record_ignored("callback");
            return;
        }

        let (request, created) = self.inner.registry.get_or_create(user);
        let discriminator = callback.discriminator();
        if let Some(endpoint) = request.matching_endpoint(&discriminator) {
            debug!(user = %user, endpoint = %endpoint, "Callback matched");
            self.acknowledge(callback).await;
            if request.complete_with_callback(callback.clone()) {
                debug!(user = %user, callback_id = %callback.id, "Wait completed by callback");
            }
            self.clear_marker(user).await;
        } else {
            trace!(user = %user, discriminator = %discriminator, "Ignoring callback, no endpoint matched");
            InputMetrics::record_ignored("callback");
        }
        self.drop_orphan(user, &request, created);
    }

    async fn is_marked(&self, user: UserId) -> bool {
        match self.inner.store.get(user).await {
            Ok(Some(state)) => state == self.inner.config.marker,
            Ok(None) => false,
            Err(error) => {
                debug!(user = %user, error = %error, "State lookup failed, treating as idle");
                false
            }
        }
    }

    async fn acknowledge(&self, callback: &Callback) {
        let Some(bot) = &self.inner.bot else {
            return;
        };
        if let Err(error) = bot.answer_callback(callback).await {
            warn!(callback_id = %callback.id, error = %error, "Failed to acknowledge callback");
            InputMetrics::record_ack_failure();
        }
    }

    /// Delete the marker of `user`, restoring it if a live wait was
    /// registered for the user in the meantime.
    async fn clear_marker(&self, user: UserId) {
        self.inner.store.delete(user).await;

        let Some(live) = self
            .inner
            .registry
            .get(user)
            .filter(|request| !request.is_completed())
        else {
            return;
        };
        if let Err(error) = self
            .inner
            .store
            .set(user, &self.inner.config.marker, live.expiration())
            .await
        {
            warn!(user = %user, error = %error, "Failed to restore marker for newer wait");
        }
    }

    /// Remove a request a handler created for a stale marker.
    fn drop_orphan(&self, user: UserId, request: &Arc<PendingRequest>, created: bool) {
        if created && self.inner.registry.remove_if_current(user, request) {
            debug!(user = %user, "Dropped request created for a stale marker");
        }
    }
}

/// Releases a wait's registry entry and marker, also when the waiting future
/// is dropped before finishing.
struct WaitGuard<'a> {
    manager: &'a InputManager,
    user: UserId,
    request: &'a Arc<PendingRequest>,
    armed: bool,
}

impl WaitGuard<'_> {
    /// Remove this wait's registry entry and report whether the marker
    /// should be cleared.
    ///
    /// The entry may already be gone, for example when `cancel` ran while
    /// the marker write was still in flight and the write landed after the
    /// cancel's cleanup. The marker is then still cleared unless a newer live
    /// wait owns it.
    fn detach(&self) -> bool {
        let registry = &self.manager.inner.registry;
        registry.remove_if_current(self.user, self.request)
            || registry
                .get(self.user)
                .is_none_or(|current| current.is_completed())
    }

    async fn release(&mut self) {
        self.armed = false;
        if self.detach() {
            self.manager.clear_marker(self.user).await;
        }
    }
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        if !self.armed || !self.detach() {
            return;
        }
        debug!(user = %self.user, "Wait dropped before finishing");
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let manager = self.manager.clone();
            let user = self.user;
            handle.spawn(async move { manager.clear_marker(user).await });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tele_input_core::{ChatId, StateStore, Utc, WAITING_INPUT};

    fn manager_with_store() -> (InputManager, Arc<MemoryStateStore>) {
        let store = Arc::new(MemoryStateStore::new());
        let manager = InputManager::builder()
            .store(Arc::clone(&store) as Arc<dyn StateStore>)
            .config(InputManagerConfig::default().with_poll_interval(Duration::from_millis(10)))
            .build();
        (manager, store)
    }

    #[tokio::test]
    async fn stale_marker_does_not_leak_registry_entries() {
        let (manager, store) = manager_with_store();
        let user = UserId::new(1);
        store.set(user, WAITING_INPUT, Duration::ZERO).await.ok();

        let message = Message::new(1, ChatId::new(1), user, "hello", Utc::now());
        manager.handle_message(&message).await;

        assert_eq!(manager.pending_count(), 0);
        assert!(!store.contains(user));
    }

    #[tokio::test]
    async fn foreign_marker_value_is_ignored() {
        let (manager, store) = manager_with_store();
        let user = UserId::new(2);
        store.set(user, "editing_profile", Duration::ZERO).await.ok();

        let message = Message::new(1, ChatId::new(2), user, "hello", Utc::now());
        manager.handle_message(&message).await;

        assert_eq!(manager.pending_count(), 0);
        assert!(store.contains(user), "unrelated state must survive");
    }

    #[tokio::test]
    async fn dropped_wait_releases_registry_entry() {
        let (manager, _store) = manager_with_store();
        let user = UserId::new(3);

        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            manager.get(&Context::background(), user, Duration::ZERO, Vec::<&str>::new()),
        )
        .await;

        assert!(outcome.is_err());
        assert!(!manager.is_waiting(user));
    }

    #[tokio::test]
    async fn clear_marker_restores_marker_of_newer_wait() {
        let (manager, store) = manager_with_store();
        let user = UserId::new(4);
        let newer = Arc::new(PendingRequest::new([], Duration::from_secs(60)));
        manager.inner.registry.store(user, newer);
        store.set(user, WAITING_INPUT, Duration::ZERO).await.ok();

        manager.clear_marker(user).await;

        assert!(store.contains(user));
    }
}
