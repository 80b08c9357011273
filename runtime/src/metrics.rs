//! Prometheus metrics for form submissions.
//!
//! Recorded by [`crate::ActionStore::dispatch`]:
//! - `form_action.submissions.total`: completed submissions, labelled by
//!   resulting `tag`
//! - `form_action.submissions.errors`: submissions that ended in a
//!   propagated error
//! - `form_action.submission.duration_seconds`: time from dispatch to the
//!   next state
//!
//! # Example
//!
//! ```rust,no_run
//! use form_action_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // later, e.g. from a `/metrics` route
//! let body = server.render().unwrap_or_default();
//! # Ok(())
//! # }
//! ```

use form_action_core::state::StateTag;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, histogram};

/// Completed submissions, labelled by tag.
pub const SUBMISSIONS_TOTAL: &str = "form_action.submissions.total";
/// Submissions that ended in a propagated error.
pub const SUBMISSION_ERRORS: &str = "form_action.submissions.errors";
/// Submission latency.
pub const SUBMISSION_DURATION: &str = "form_action.submission.duration_seconds";

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

/// Prometheus recorder with an address to advertise.
///
/// Rendering is left to the host application, which typically serves
/// [`MetricsServer::render`] from a route.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a metrics server for `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Describe the submission metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the exporter cannot be built or installed.
    /// An already installed recorder is not an error.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                if message.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(message))
                }
            }
        }
    }

    /// The advertised address.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!(SUBMISSIONS_TOTAL, "Completed form submissions by resulting tag");
    describe_counter!(SUBMISSION_ERRORS, "Form submissions that ended in a propagated error");
    describe_histogram!(SUBMISSION_DURATION, "Time from dispatch to the next submission state");
}

/// Submission metrics recorder.
pub struct SubmissionMetrics;

impl SubmissionMetrics {
    /// Record a completed submission.
    pub fn record_outcome(tag: StateTag, duration: Duration) {
        counter!(SUBMISSIONS_TOTAL, "tag" => tag.as_str()).increment(1);
        histogram!(SUBMISSION_DURATION).record(duration.as_secs_f64());
    }

    /// Record a submission that ended in an error.
    pub fn record_error(duration: Duration) {
        counter!(SUBMISSION_ERRORS).increment(1);
        histogram!(SUBMISSION_DURATION).record(duration.as_secs_f64());
    }
}
