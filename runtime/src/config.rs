//! Engine configuration.

use std::time::Duration;
use tele_input_core::WAITING_INPUT;

/// Tunables for [`InputManager`](crate::InputManager).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tele_input_runtime::InputManagerConfig;
///
/// let config = InputManagerConfig::default()
///     .with_poll_interval(Duration::from_millis(50))
///     .with_text_completes_button_waits(false);
/// assert_eq!(config.poll_interval, Duration::from_millis(50));
/// assert_eq!(config.marker, "waiting_input");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputManagerConfig {
    /// Upper bound between two checks of a wait's state.
    pub poll_interval: Duration,
    /// Marker written to the state store while a user has a wait outstanding.
    pub marker: String,
    /// Whether a text message also completes a wait that registered buttons.
    pub text_completes_button_waits: bool,
}

impl InputManagerConfig {
    /// Default interval between checks of a wait's state.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// Set the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the state store marker.
    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Choose whether text messages complete waits that registered buttons.
    #[must_use]
    pub const fn with_text_completes_button_waits(mut self, enabled: bool) -> Self {
        self.text_completes_button_waits = enabled;
        self
    }
}

impl Default for InputManagerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            marker: WAITING_INPUT.to_string(),
            text_completes_button_waits: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_wire_contract() {
        let config = InputManagerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.marker, WAITING_INPUT);
        assert!(config.text_completes_button_waits);
    }

    #[test]
    fn setters_chain() {
        let config = InputManagerConfig::default()
            .with_marker("awaiting_reply")
            .with_poll_interval(Duration::from_millis(5))
            .with_text_completes_button_waits(false);
        assert_eq!(config.marker, "awaiting_reply");
        assert_eq!(config.poll_interval, Duration::from_millis(5));
        assert!(!config.text_completes_button_waits);
    }
}
