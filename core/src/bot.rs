//! Outbound bot API contract.
//!
//! The engine only needs to acknowledge button presses, and the message
//! collector needs to send and delete messages. Everything else the bot
//! transport can do stays outside this workspace.

use crate::BoxFuture;
use crate::update::{Callback, ChatId, Message};
use thiserror::Error;

/// Errors returned by the bot API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BotError {
    /// The API answered with an error.
    #[error("Bot API error {code}: {description}")]
    Api {
        /// Error code reported by the API
        code: i32,
        /// Human readable description
        description: String,
    },

    /// The request never reached the API or the response was lost.
    #[error("Bot transport error: {0}")]
    Transport(String),
}

/// Outbound operations of a bot.
///
/// Implementations must be `Send + Sync` so one client can be shared by the
/// engine and by every handler task.
pub trait BotApi: Send + Sync {
    /// Acknowledge a button press so the client stops showing its loading
    /// indicator.
    ///
    /// # Errors
    ///
    /// Returns [`BotError`] if the acknowledgement could not be delivered.
    fn answer_callback<'a>(&'a self, callback: &'a Callback) -> BoxFuture<'a, Result<(), BotError>>;

    /// Send a text message to `chat` and return the sent message.
    ///
    /// # Errors
    ///
    /// Returns [`BotError`] if sending fails.
    fn send_text<'a>(&'a self, chat: ChatId, text: &'a str) -> BoxFuture<'a, Result<Message, BotError>>;

    /// Delete a previously sent message.
    ///
    /// # Errors
    ///
    /// Returns [`BotError`] if deletion fails.
    fn delete_message<'a>(&'a self, message: &'a Message) -> BoxFuture<'a, Result<(), BotError>>;
}
