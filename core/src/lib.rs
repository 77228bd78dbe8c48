//! # Tele Input Core
//!
//! Core types and collaborator contracts for correlating bot user input with
//! requests that are waiting for it.
//!
//! A bot handler that needs "the next thing user U says" registers a pending
//! wait with the engine in `tele-input-runtime` and blocks. The transport
//! keeps feeding inbound events to the engine's handlers, which complete the
//! wait when an event matches. This crate holds everything both sides agree
//! on, without any engine logic:
//!
//! - **Updates**: [`UserId`], [`ChatId`], [`Message`], [`Callback`]
//! - **Discriminators**: how a button press is matched against a wait
//! - **State store**: the per-user marker contract ([`StateStore`])
//! - **Bot API**: outbound calls the engine and collector need ([`BotApi`])
//! - **Context**: cancellation and deadlines for blocking waits ([`Context`])
//!
//! ## Example
//!
//! ```
//! use tele_input_core::{Button, Callback, CallbackEndpoint, UserId};
//!
//! let confirm = Button::new("confirm", "Confirm").with_data("order-1");
//! let press = Callback {
//!     id: "q-1".to_string(),
//!     sender: UserId::new(10),
//!     unique: None,
//!     data: confirm.callback_data(),
//!     message: None,
//! };
//!
//! assert!(press.discriminator().matches(confirm.callback_unique()));
//! ```

use std::future::Future;
use std::pin::Pin;

/// Boxed, sendable future returned by dyn-compatible collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outbound bot API contract
pub mod bot;

/// Cancellation context for blocking waits
pub mod context;

/// Button identities and matching
pub mod discriminator;

/// Per-user state storage contract
pub mod state_store;

/// Inbound event types
pub mod update;

pub use bot::{BotApi, BotError};
pub use context::{Context, ContextError};
pub use discriminator::{Button, CallbackEndpoint, Discriminator};
pub use state_store::{StateStore, StateStoreError, WAITING_INPUT};
pub use update::{Callback, ChatId, Message, UserId};

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use tokio_util::sync::CancellationToken;
