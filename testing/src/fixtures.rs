//! Builders for inbound updates.

use std::sync::atomic::{AtomicI64, Ordering};
use tele_input_core::{Button, Callback, ChatId, Message, UserId};

static NEXT_ID: AtomicI64 = AtomicI64::new(1);

fn next_id() -> i64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// A text message from `user` in their private chat.
#[must_use]
pub fn text_message(user: UserId, text: &str) -> Message {
    Message::new(
        next_id(),
        ChatId::new(user.get()),
        user,
        text,
        crate::test_time(),
    )
}

/// A press of `button` by `user`, attached to `message` if given.
///
/// The callback carries the button's raw payload only, as transports that
/// do not split out the unique identifier deliver it.
#[must_use]
pub fn button_press(user: UserId, button: &Button, message: Option<Message>) -> Callback {
    raw_callback(user, &button.callback_data(), message)
}

/// A press carrying an explicit unique identifier next to its payload.
#[must_use]
pub fn unique_press(user: UserId, unique: &str, data: &str, message: Option<Message>) -> Callback {
    Callback {
        id: format!("cbq-{}", next_id()),
        sender: user,
        unique: Some(unique.to_string()),
        data: data.to_string(),
        message,
    }
}

/// A press with arbitrary raw callback data.
#[must_use]
pub fn raw_callback(user: UserId, data: &str, message: Option<Message>) -> Callback {
    Callback {
        id: format!("cbq-{}", next_id()),
        sender: user,
        unique: None,
        data: data.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_get_distinct_ids() {
        let user = UserId::new(3);
        let first = text_message(user, "a");
        let second = text_message(user, "b");
        assert_ne!(first.id, second.id);
        assert_eq!(first.chat, ChatId::new(3));
    }

    #[test]
    fn button_press_round_trips_discriminator() {
        let button = Button::new("next", "Next").with_data("page-2");
        let press = button_press(UserId::new(1), &button, None);
        assert_eq!(press.discriminator().as_str(), "next");
        assert_eq!(press.payload(), Some("page-2"));
    }
}
