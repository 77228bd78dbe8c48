//! Record-then-bulk-delete helper for bot messages.
//!
//! Multi-step dialogs tend to leave a trail of prompts behind. A
//! [`MessageCollector`] remembers every message sent through it (or handed
//! to it) so the whole trail can be deleted once the dialog is over.

use tele_input_core::{BotApi, BotError, ChatId, Message};

/// Options for [`MessageCollector::clear`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearOptions {
    /// Keep deleting after a failed deletion instead of stopping.
    pub ignore_errors: bool,
    /// Leave the most recently collected message in place.
    pub exclude_last: bool,
}

impl ClearOptions {
    /// Keep deleting after a failed deletion.
    #[must_use]
    pub const fn ignore_errors(mut self) -> Self {
        self.ignore_errors = true;
        self
    }

    /// Leave the most recently collected message in place.
    #[must_use]
    pub const fn exclude_last(mut self) -> Self {
        self.exclude_last = true;
        self
    }
}

/// Collects messages so they can be deleted in one go.
///
/// # Example
///
/// ```
/// use tele_input_core::{ChatId, Message, UserId, Utc};
/// use tele_input_runtime::collector::MessageCollector;
///
/// let mut collector = MessageCollector::new();
/// collector.collect(Message::new(1, ChatId::new(9), UserId::new(9), "Name?", Utc::now()));
/// assert_eq!(collector.messages().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageCollector {
    messages: Vec<Message>,
}

impl MessageCollector {
    /// Create an empty collector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Remember `message` for later deletion.
    pub fn collect(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Send `text` to `chat` and collect the sent message.
    ///
    /// # Errors
    ///
    /// Returns the bot error if sending fails; nothing is collected then.
    pub async fn send(
        &mut self,
        bot: &dyn BotApi,
        chat: ChatId,
        text: &str,
    ) -> Result<Message, BotError> {
        let message = bot.send_text(chat, text).await?;
        self.collect(message.clone());
        Ok(message)
    }

    /// Collected messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Delete every collected message and empty the collector.
    ///
    /// With `exclude_last`, the most recent message is neither deleted nor
    /// kept: the collector is still emptied.
    ///
    /// # Errors
    ///
    /// Unless `ignore_errors` is set, stops at the first failed deletion and
    /// returns its error, leaving the collector untouched.
    pub async fn clear(&mut self, bot: &dyn BotApi, options: ClearOptions) -> Result<(), BotError> {
        let keep_last = options.exclude_last && !self.messages.is_empty();
        let count = self.messages.len() - usize::from(keep_last);

        for message in &self.messages[..count] {
            if let Err(error) = bot.delete_message(message).await {
                if !options.ignore_errors {
                    return Err(error);
                }
                tracing::debug!(
                    chat = %message.chat,
                    message_id = message.id,
                    error = %error,
                    "Ignoring failed message deletion"
                );
            }
        }

        self.messages.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tele_input_core::{UserId, Utc};

    #[test]
    fn collects_in_order() {
        let mut collector = MessageCollector::new();
        for id in 1..=3 {
            collector.collect(Message::new(id, ChatId::new(1), UserId::new(1), "x", Utc::now()));
        }
        let ids: Vec<i64> = collector.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn options_builders_set_flags() {
        let options = ClearOptions::default().ignore_errors().exclude_last();
        assert!(options.ignore_errors);
        assert!(options.exclude_last);
    }
}
