//! Fire-and-forget reporting of captured exceptions.
//!
//! The aggregator hands each capture to an injected [`ReportSink`]. The
//! production sink queues reports on a bounded channel without blocking; a
//! [`ReportDispatcher`] drains the queue in the background.

use std::env::consts::{ARCH, OS};

use {
    async_channel::{Receiver, Sender, TrySendError, bounded},
    chrono::{DateTime, Utc},
    serde::Serialize,
    serde_json::{Error as SerdeJsonError, to_string},
    thiserror::Error,
    tracing::{debug, warn},
};

use crate::capture::aggregator::HistoryEntry;

/// Default reporting endpoint label.
pub const DEFAULT_REPORT_ENDPOINT: &str = "/api/errors";

/// Error type for report submission and delivery.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The outgoing queue has no free slot.
    #[error("Report queue is full")]
    QueueFull,
    /// The dispatcher is gone.
    #[error("Report channel closed")]
    ChannelClosed,
    /// The report could not be serialized.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] SerdeJsonError),
    /// The sink refused the report.
    #[error("Report rejected: {reason}")]
    Rejected { reason: String },
}

/// Host details attached to every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportContext {
    /// Client identification, the equivalent of a user agent.
    pub client_info: String,
    /// Address of the page the calculator runs in.
    pub url: Option<String>,
}

impl Default for ReportContext {
    fn default() -> Self {
        Self {
            client_info: default_client_info(),
            url: None,
        }
    }
}

/// Client identification derived from the build.
#[must_use]
pub fn default_client_info() -> String {
    format!(
        "{}/{} ({OS}; {ARCH})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}

/// Structured payload sent for a captured exception.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub message: String,
    pub source: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub client_info: String,
    pub url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorReport {
    /// Builds the report for a history entry.
    #[must_use]
    pub fn new(entry: &HistoryEntry, context: &ReportContext) -> Self {
        Self {
            message: entry.message.clone(),
            source: entry.source.clone(),
            line: entry.line,
            column: entry.column,
            client_info: context.client_info.clone(),
            url: context.url.clone(),
            timestamp: entry.timestamp,
        }
    }
}

/// Destination for error reports.
///
/// `submit` must return promptly; failures are returned to the caller,
/// which logs and drops them. A panic in `submit` is caught by the
/// aggregator, except when the capture runs inside the panic hook, where
/// the standard library aborts on any second panic.
pub trait ReportSink: Send + Sync {
    /// Hands a report over for delivery.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if the report cannot be accepted.
    fn submit(&self, report: ErrorReport) -> Result<(), ReportError>;
}

/// Sink that accepts and discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSink;

impl ReportSink for DisabledSink {
    fn submit(&self, _report: ErrorReport) -> Result<(), ReportError> {
        Ok(())
    }
}

/// Sink that queues reports for a [`ReportDispatcher`].
#[derive(Debug, Clone)]
pub struct ChannelReportSink {
    sender: Sender<ErrorReport>,
}

impl ChannelReportSink {
    /// Creates a sink and the dispatcher draining it.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of queued reports (at least 1).
    ///
    /// # Returns
    ///
    /// The sink and its dispatcher.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, ReportDispatcher) {
        let (sender, receiver) = bounded(capacity.max(1));
        (
            Self { sender },
            ReportDispatcher {
                receiver,
                endpoint: DEFAULT_REPORT_ENDPOINT.to_string(),
            },
        )
    }
}

impl ReportSink for ChannelReportSink {
    fn submit(&self, report: ErrorReport) -> Result<(), ReportError> {
        self.sender.try_send(report).map_err(|e| match e {
            TrySendError::Full(_) => ReportError::QueueFull,
            TrySendError::Closed(_) => ReportError::ChannelClosed,
        })
    }
}

/// Background task that delivers queued reports.
///
/// Delivery is a stub: the report is serialized and logged at debug level.
#[derive(Debug)]
pub struct ReportDispatcher {
    receiver: Receiver<ErrorReport>,
    endpoint: String,
}

impl ReportDispatcher {
    /// Sets the endpoint label reports are addressed to.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Drains the queue until every sink has been dropped.
    ///
    /// # Returns
    ///
    /// The number of reports delivered.
    pub async fn run(self) -> usize {
        let mut delivered = 0;
        while let Ok(report) = self.receiver.recv().await {
            match self.deliver(&report) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(endpoint = %self.endpoint, error = %e, "Failed to deliver error report");
                }
            }
        }
        debug!(delivered, "Report dispatcher stopped");
        delivered
    }

    fn deliver(&self, report: &ErrorReport) -> Result<(), ReportError> {
        let body = to_string(report)?;
        debug!(endpoint = %self.endpoint, %body, "Sending error report");
        Ok(())
    }
}
