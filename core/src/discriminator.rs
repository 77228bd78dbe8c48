//! Button identities used to match callbacks against a pending wait.
//!
//! A wait that should be satisfied by a button press registers the
//! discriminators of the buttons it accepts. Inbound callbacks are matched by
//! comparing their extracted discriminator with each registered one, both
//! sides trimmed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized identity of an inline keyboard button.
///
/// Construction trims surrounding whitespace, so two discriminators compare
/// equal whenever their trimmed text is equal.
///
/// # Examples
///
/// ```
/// use tele_input_core::discriminator::Discriminator;
///
/// assert_eq!(Discriminator::new(" yes\n"), Discriminator::new("yes"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Discriminator(String);

impl Discriminator {
    /// Create a discriminator, trimming surrounding whitespace.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    /// Get the normalized text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the normalized text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `endpoint` identifies the same button.
    #[must_use]
    pub fn matches(&self, endpoint: &(impl CallbackEndpoint + ?Sized)) -> bool {
        self.0 == endpoint.callback_unique().trim()
    }
}

impl fmt::Display for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Discriminator {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Discriminator {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&Button> for Discriminator {
    fn from(button: &Button) -> Self {
        Self::new(&button.unique)
    }
}

impl From<Button> for Discriminator {
    fn from(button: Button) -> Self {
        Self::new(button.unique)
    }
}

/// Anything that names a button a wait can accept.
pub trait CallbackEndpoint {
    /// Unique identifier of the button.
    fn callback_unique(&self) -> &str;
}

impl CallbackEndpoint for str {
    fn callback_unique(&self) -> &str {
        self
    }
}

impl CallbackEndpoint for String {
    fn callback_unique(&self) -> &str {
        self
    }
}

impl CallbackEndpoint for Discriminator {
    fn callback_unique(&self) -> &str {
        &self.0
    }
}

impl CallbackEndpoint for Button {
    fn callback_unique(&self) -> &str {
        &self.unique
    }
}

/// An inline keyboard button.
///
/// # Examples
///
/// ```
/// use tele_input_core::discriminator::{Button, CallbackEndpoint};
///
/// let button = Button::new("confirm", "Confirm").with_data("order-7");
/// assert_eq!(button.callback_unique(), "confirm");
/// assert_eq!(button.callback_data(), "\u{c}confirm|order-7");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Unique identifier, the part callbacks are matched on
    pub unique: String,
    /// Label shown to the user
    pub text: String,
    /// Extra payload carried after the identifier
    pub data: String,
}

impl Button {
    /// Create a button without payload.
    #[must_use]
    pub fn new(unique: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            unique: unique.into(),
            text: text.into(),
            data: String::new(),
        }
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    /// Raw callback data sent back when the button is pressed.
    ///
    /// Format: `\f{unique}` followed by `|{data}` when a payload is set.
    #[must_use]
    pub fn callback_data(&self) -> String {
        if self.data.is_empty() {
            format!("\u{c}{}", self.unique)
        } else {
            format!("\u{c}{}|{}", self.unique, self.data)
        }
    }
}
