//! Inbound event types delivered by the bot transport.
//!
//! The transport layer (long polling, webhooks, wire parsing) lives outside
//! this workspace. It hands the engine two kinds of already-parsed events:
//!
//! - [`Message`]: a text message sent by a user
//! - [`Callback`]: an inline keyboard button press
//!
//! Both carry the identity of the user who produced them, which is the key
//! every pending wait is correlated on.

use crate::discriminator::Discriminator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a bot user.
///
/// Pending waits, state store markers and inbound events are all keyed by
/// this value.
///
/// # Examples
///
/// ```
/// use tele_input_core::update::UserId;
///
/// let user = UserId::new(42);
/// assert_eq!(user.get(), 42);
/// assert_eq!(user.to_string(), "42");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    /// Create a user identity from its numeric id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the numeric id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Identity of a chat (private chat, group or channel).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(i64);

impl ChatId {
    /// Create a chat identity from its numeric id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the numeric id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A message in a chat.
///
/// Inbound text messages complete waits registered without callback
/// endpoints. Messages sent by the bot itself are returned by
/// [`BotApi::send_text`](crate::bot::BotApi::send_text) and are what
/// inline keyboards are attached to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message id, unique within its chat
    pub id: i64,
    /// Chat the message belongs to
    pub chat: ChatId,
    /// User who sent the message
    pub sender: UserId,
    /// Text content (empty for non-text messages)
    pub text: String,
    /// When the message was sent
    pub date: DateTime<Utc>,
}

impl Message {
    /// Create a text message.
    #[must_use]
    pub fn new(
        id: i64,
        chat: ChatId,
        sender: UserId,
        text: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            chat,
            sender,
            text: text.into(),
            date,
        }
    }
}

/// An inline keyboard button press.
///
/// `unique` holds the button's unique identifier when the transport already
/// split it out of the payload. Otherwise the identifier is the first
/// `|`-separated segment of `data` (see [`Callback::discriminator`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callback {
    /// Callback query id, used to acknowledge the press
    pub id: String,
    /// User who pressed the button
    pub sender: UserId,
    /// Explicit unique identifier of the pressed button, if known
    pub unique: Option<String>,
    /// Raw callback data attached to the button
    pub data: String,
    /// Message the button was attached to
    pub message: Option<Message>,
}

impl Callback {
    /// Extract the normalized discriminator of the pressed button.
    ///
    /// Lookup order:
    /// 1. the explicit `unique` field, when present and non-empty
    /// 2. the first `|`-separated segment of `data`
    ///
    /// The result is trimmed of surrounding whitespace, which also strips the
    /// `\f` marker inline keyboard payloads start with.
    ///
    /// # Examples
    ///
    /// ```
    /// use tele_input_core::update::{Callback, UserId};
    ///
    /// let press = Callback {
    ///     id: "1".to_string(),
    ///     sender: UserId::new(7),
    ///     unique: None,
    ///     data: "\u{c}confirm|order-9".to_string(),
    ///     message: None,
    /// };
    /// assert_eq!(press.discriminator().as_str(), "confirm");
    /// ```
    #[must_use]
    pub fn discriminator(&self) -> Discriminator {
        match self.unique.as_deref() {
            Some(unique) if !unique.is_empty() => Discriminator::new(unique),
            _ => {
                let head = self.data.split('|').next().unwrap_or_default();
                Discriminator::new(head)
            }
        }
    }

    /// Payload part of `data` (everything after the first `|`), if any.
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        self.data.split_once('|').map(|(_, rest)| rest)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can use unwrap
    use super::*;

    fn press(unique: Option<&str>, data: &str) -> Callback {
        Callback {
            id: "cb-1".to_string(),
            sender: UserId::new(1),
            unique: unique.map(str::to_string),
            data: data.to_string(),
            message: None,
        }
    }

    #[test]
    fn explicit_unique_wins_over_data() {
        let cb = press(Some("  approve "), "reject|1");
        assert_eq!(cb.discriminator().as_str(), "approve");
    }

    #[test]
    fn empty_unique_falls_back_to_data() {
        let cb = press(Some(""), " reject |1");
        assert_eq!(cb.discriminator().as_str(), "reject");
    }

    #[test]
    fn data_without_pipe_is_used_whole() {
        let cb = press(None, "menu");
        assert_eq!(cb.discriminator().as_str(), "menu");
        assert_eq!(cb.payload(), None);
    }

    #[test]
    fn form_feed_prefix_is_stripped() {
        let cb = press(None, "\u{c}buy|sku-1|2");
        assert_eq!(cb.discriminator().as_str(), "buy");
        assert_eq!(cb.payload(), Some("sku-1|2"));
    }

    #[test]
    fn empty_data_yields_empty_discriminator() {
        let cb = press(None, "");
        assert!(cb.discriminator().is_empty());
    }

    #[test]
    fn user_id_roundtrips_through_json() {
        let json = serde_json::to_string(&UserId::new(99)).unwrap();
        assert_eq!(json, "99");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, UserId::new(99));
    }
}
