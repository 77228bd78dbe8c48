//! Prometheus metrics for the input engine.
//!
//! Metrics recorded by the engine:
//! - Waits started, and waits finished per outcome
//! - Wait duration
//! - Inbound events ignored per kind
//! - Pending requests currently registered
//!
//! Recording goes through the global `metrics` recorder, so nothing is
//! exported until a recorder is installed, e.g. by [`MetricsServer::start`].
//!
//! # Example
//!
//! ```rust,no_run
//! use tele_input_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! if let Some(text) = server.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics exporter.
///
/// Installs the global recorder and renders the scrape payload. Serving it
/// over HTTP is left to the host application.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address the host application will expose metrics on
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Describe the engine's metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., in tests), the call succeeds
    /// without a handle and metrics keep flowing to the existing recorder.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Address metrics are meant to be exposed on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(
        "input_waits_started_total",
        "Total number of waits registered"
    );
    describe_counter!(
        "input_waits_completed_total",
        "Total number of waits finished, labelled by outcome"
    );
    describe_histogram!(
        "input_wait_duration_seconds",
        "Time between registering a wait and its outcome"
    );
    describe_counter!(
        "input_events_ignored_total",
        "Inbound events that did not complete a wait, labelled by kind"
    );
    describe_counter!(
        "input_callback_ack_failures_total",
        "Button press acknowledgements that could not be delivered"
    );
    describe_gauge!(
        "input_pending_requests",
        "Pending requests currently registered"
    );
}

/// How a wait finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Completed by a text message
    Message,
    /// Completed by a button press
    Callback,
    /// Canceled explicitly or superseded
    Canceled,
    /// The caller's context was canceled or expired
    ContextDone,
    /// The wait's own timeout elapsed
    Timeout,
    /// The state store rejected the marker
    StorageError,
}

impl WaitOutcome {
    /// Label value used in metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Callback => "callback",
            Self::Canceled => "canceled",
            Self::ContextDone => "context_done",
            Self::Timeout => "timeout",
            Self::StorageError => "storage_error",
        }
    }
}

/// Input engine metrics recorder.
pub struct InputMetrics;

impl InputMetrics {
    /// Record a wait being registered.
    pub fn record_wait_started() {
        counter!("input_waits_started_total").increment(1);
    }

    /// Record a finished wait.
    pub fn record_wait_finished(outcome: WaitOutcome, duration: Duration) {
        counter!("input_waits_completed_total", "outcome" => outcome.as_str()).increment(1);
        histogram!("input_wait_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record an inbound event that completed nothing.
    pub fn record_ignored(kind: &'static str) {
        counter!("input_events_ignored_total", "kind" => kind).increment(1);
    }

    /// Record a failed button press acknowledgement.
    pub fn record_ack_failure() {
        counter!("input_callback_ack_failures_total").increment(1);
    }

    /// Record the number of registered pending requests.
    #[allow(clippy::cast_precision_loss)] // Registry sizes stay far below 2^52
    pub fn record_pending(count: usize) {
        gauge!("input_pending_requests").set(count as f64);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn test_metrics_server_creation() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert!(server.handle().is_none());
        assert_eq!(server.addr(), addr);
    }

    #[tokio::test]
    async fn test_metrics_server_render() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let mut server = MetricsServer::new(addr);
        server.start().unwrap();

        InputMetrics::record_wait_started();
        InputMetrics::record_wait_finished(WaitOutcome::Timeout, Duration::from_millis(300));
        InputMetrics::record_ignored("message");
        InputMetrics::record_pending(3);

        // If another test installed the recorder first, handle is None.
        if let Some(rendered) = server.render() {
            assert!(rendered.contains("input_waits_started_total"));
            assert!(rendered.contains("input_waits_completed_total"));
            assert!(rendered.contains("outcome=\"timeout\""));
        }
    }

    #[test]
    fn outcome_labels_are_distinct() {
        let labels = [
            WaitOutcome::Message,
            WaitOutcome::Callback,
            WaitOutcome::Canceled,
            WaitOutcome::ContextDone,
            WaitOutcome::Timeout,
            WaitOutcome::StorageError,
        ]
        .map(WaitOutcome::as_str);
        let unique: std::collections::HashSet<_> = labels.iter().collect();
        assert_eq!(unique.len(), labels.len());
    }
}
