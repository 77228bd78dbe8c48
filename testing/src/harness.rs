//! Fluent harness wiring an engine to mock collaborators.

use crate::fixtures::{button_press, text_message};
use crate::mocks::RecordingBot;
use std::sync::Arc;
use std::time::Duration;
use tele_input_core::{Button, Context, Discriminator, Message, StateStore, UserId};
use tele_input_runtime::{InputError, InputManager, InputManagerConfig, MemoryStateStore, Response};
use tokio::task::JoinHandle;

/// Poll interval used by harness engines, short enough to keep tests fast.
pub const TEST_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// An [`InputManager`] with a [`RecordingBot`] and an inspectable store.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tele_input_core::UserId;
/// use tele_input_testing::InputHarness;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let harness = InputHarness::new();
/// let user = UserId::new(5);
///
/// let wait = harness.spawn_wait(user, Duration::ZERO, Vec::<&str>::new()).await;
/// harness.say(user, "hello").await;
///
/// let response = wait.await??;
/// assert_eq!(response.text(), Some("hello"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InputHarness {
    /// Engine under test
    pub manager: InputManager,
    /// Bot receiving acknowledgements
    pub bot: Arc<RecordingBot>,
    /// Marker store backing the engine
    pub store: MemoryStateStore,
}

impl Default for InputHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHarness {
    /// Harness with default configuration and a short poll interval.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(InputManagerConfig::default().with_poll_interval(TEST_POLL_INTERVAL))
    }

    /// Harness using `config`.
    #[must_use]
    pub fn with_config(config: InputManagerConfig) -> Self {
        let bot = Arc::new(RecordingBot::new());
        let store = MemoryStateStore::new();
        let manager = InputManager::builder()
            .config(config)
            .store(Arc::new(store.clone()) as Arc<dyn StateStore>)
            .bot(Arc::clone(&bot) as Arc<dyn tele_input_core::BotApi>)
            .build();
        Self {
            manager,
            bot,
            store,
        }
    }

    /// Start a wait on its own task and return once it is registered.
    pub async fn spawn_wait<I>(
        &self,
        user: UserId,
        timeout: Duration,
        endpoints: I,
    ) -> JoinHandle<Result<Response, InputError>>
    where
        I: IntoIterator,
        I::Item: Into<Discriminator>,
    {
        self.spawn_wait_with(Context::background(), user, timeout, endpoints)
            .await
    }

    /// Like [`spawn_wait`](Self::spawn_wait) with a caller-supplied context.
    pub async fn spawn_wait_with<I>(
        &self,
        ctx: Context,
        user: UserId,
        timeout: Duration,
        endpoints: I,
    ) -> JoinHandle<Result<Response, InputError>>
    where
        I: IntoIterator,
        I::Item: Into<Discriminator>,
    {
        let endpoints: Vec<Discriminator> = endpoints.into_iter().map(Into::into).collect();
        let manager = self.manager.clone();
        let handle =
            tokio::spawn(async move { manager.get(&ctx, user, timeout, endpoints).await });
        self.until_marked(user).await;
        handle
    }

    /// Wait until `user` has a registered wait and a marker, or until the
    /// wait task ended early.
    pub async fn until_marked(&self, user: UserId) {
        for _ in 0..1000 {
            if self.manager.is_waiting(user) && self.store.contains(user) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Deliver a text message from `user` and return it.
    pub async fn say(&self, user: UserId, text: &str) -> Message {
        let message = text_message(user, text);
        self.manager.handle_message(&message).await;
        message
    }

    /// Deliver a press of `button` by `user`, attached to `attached`.
    pub async fn press(&self, user: UserId, button: &Button, attached: Option<Message>) {
        let callback = button_press(user, button, attached);
        self.manager.handle_callback(&callback).await;
    }

    /// Whether `user` has neither a registered wait nor a marker.
    #[must_use]
    pub fn is_idle(&self, user: UserId) -> bool {
        !self.manager.is_waiting(user) && !self.store.contains(user)
    }
}
