//! Process-scoped aggregation of uncaught failures.
//!
//! The `CaptureAggregator` counts every capture by kind, keeps a bounded
//! history of recent uncaught exceptions, forwards those exceptions to a
//! report sink and notifies subscribers.

use std::{
    cell::Cell,
    collections::{BTreeMap, VecDeque},
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use {
    chrono::{DateTime, Utc},
    parking_lot::Mutex,
    serde::Serialize,
    tokio::sync::broadcast::{Receiver, Sender, channel},
    tracing::{debug, error, warn},
};

use crate::capture::{
    reporter::{DisabledSink, ErrorReport, ReportContext, ReportSink},
    signal::{CaptureOutcome, UNHANDLED_REJECTION_KIND, UncaughtException, UnhandledRejection},
};

/// Number of uncaught exceptions kept in the recent history by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as running a capture until dropped.
struct CaptureGuard;

impl CaptureGuard {
    /// Returns `None` if a capture is already running on this thread.
    fn enter() -> Option<Self> {
        CAPTURING.with(|capturing| (!capturing.replace(true)).then_some(Self))
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        CAPTURING.with(|capturing| capturing.set(false));
    }
}

/// One uncaught exception in the recent history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub message: String,
    pub source: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub timestamp: DateTime<Utc>,
    /// Classification kind name.
    pub kind: String,
}

/// Owned copy of the aggregator's statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    /// Captures of either signal over the aggregator's lifetime.
    pub total: u64,
    /// Captures per classification kind.
    pub type_counts: BTreeMap<String, u64>,
    /// Most recent uncaught exceptions, oldest first.
    pub recent_history: Vec<HistoryEntry>,
}

/// Notification sent to subscribers after each capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// An uncaught exception was recorded.
    Uncaught(HistoryEntry),
    /// An unhandled rejection was counted.
    Rejection { reason: String },
}

/// Runtime configuration of the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Maximum history length (at least 1).
    pub history_limit: usize,
    /// Whether uncaught exceptions are forwarded to the report sink.
    pub reporting_enabled: bool,
    /// Host details attached to reports.
    pub context: ReportContext,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            reporting_enabled: true,
            context: ReportContext::default(),
        }
    }
}

#[derive(Debug, Default)]
struct StatsState {
    total: u64,
    type_counts: BTreeMap<String, u64>,
    history: VecDeque<HistoryEntry>,
}

impl StatsState {
    fn count(&mut self, kind: &str) {
        self.total += 1;
        *self.type_counts.entry(kind.to_string()).or_insert(0) += 1;
    }

    fn push_history(&mut self, entry: HistoryEntry, limit: usize) {
        self.history.push_back(entry);
        while self.history.len() > limit {
            self.history.pop_front();
        }
    }

    fn snapshot(&self) -> GlobalStats {
        GlobalStats {
            total: self.total,
            type_counts: self.type_counts.clone(),
            recent_history: self.history.iter().cloned().collect(),
        }
    }
}

/// Aggregates uncaught exceptions and unhandled rejections.
///
/// Construct one per process and share it (`Arc`) with the signal sources.
/// All state sits behind a single mutex; the sink and subscribers are
/// notified after the lock is released, so a capture never re-enters it.
pub struct CaptureAggregator {
    stats: Mutex<StatsState>,
    config: CaptureConfig,
    sink: Arc<dyn ReportSink>,
    events_tx: Sender<CaptureEvent>,
}

impl CaptureAggregator {
    /// Creates an aggregator.
    ///
    /// # Arguments
    ///
    /// * `config` - Runtime configuration; a zero history limit is raised to 1.
    /// * `sink` - Destination for reports of uncaught exceptions.
    ///
    /// # Returns
    ///
    /// A new `CaptureAggregator` with empty statistics.
    pub fn new(mut config: CaptureConfig, sink: Arc<dyn ReportSink>) -> Self {
        config.history_limit = config.history_limit.max(1);
        let (events_tx, _) = channel(16);

        Self {
            stats: Mutex::new(StatsState::default()),
            config,
            sink,
            events_tx,
        }
    }

    /// Creates an aggregator with default configuration and no reporting.
    #[must_use]
    pub fn without_reporting() -> Self {
        Self::new(
            CaptureConfig {
                reporting_enabled: false,
                ..CaptureConfig::default()
            },
            Arc::new(DisabledSink),
        )
    }

    /// Records an uncaught exception.
    ///
    /// The exception is counted under its kind, appended to the history
    /// (evicting the oldest entry beyond the limit), logged, broadcast and,
    /// if enabled, reported. Report failures, including a panicking sink,
    /// are logged and dropped. A capture triggered on a thread that is
    /// already inside a capture (a sink panicking under the panic hook, or a
    /// sink calling back in) is skipped.
    ///
    /// # Returns
    ///
    /// [`CaptureOutcome::Handled`], telling the host to suppress its own
    /// error output.
    pub fn capture_uncaught(&self, signal: UncaughtException) -> CaptureOutcome {
        let Some(_guard) = CaptureGuard::enter() else {
            debug!(message = %signal.message, "Skipping capture raised during a capture");
            return CaptureOutcome::Handled;
        };

        let kind = signal.kind_name().to_string();
        let entry = HistoryEntry {
            message: signal.message,
            source: signal.source,
            line: signal.line,
            column: signal.column,
            timestamp: Utc::now(),
            kind,
        };

        {
            let mut stats = self.stats.lock();
            stats.count(&entry.kind);
            stats.push_history(entry.clone(), self.config.history_limit);
        }

        error!(
            kind = %entry.kind,
            source = ?entry.source,
            line = ?entry.line,
            column = ?entry.column,
            "Uncaught exception: {}",
            entry.message
        );

        if self.config.reporting_enabled {
            let report = ErrorReport::new(&entry, &self.config.context);
            match catch_unwind(AssertUnwindSafe(|| self.sink.submit(report))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Failed to report uncaught exception"),
                Err(_) => warn!("Report sink panicked while reporting uncaught exception"),
            }
        }

        let _ = self.events_tx.send(CaptureEvent::Uncaught(entry));
        CaptureOutcome::Handled
    }

    /// Records an unhandled rejection.
    ///
    /// Rejections are counted under [`UNHANDLED_REJECTION_KIND`] but are not
    /// added to the recent history.
    ///
    /// # Returns
    ///
    /// [`CaptureOutcome::Acknowledged`].
    pub fn capture_rejection(&self, signal: UnhandledRejection) -> CaptureOutcome {
        self.stats.lock().count(UNHANDLED_REJECTION_KIND);

        let reason = signal.reason_message();
        warn!(kind = UNHANDLED_REJECTION_KIND, "Unhandled rejection: {reason}");

        let _ = self.events_tx.send(CaptureEvent::Rejection { reason });
        CaptureOutcome::Acknowledged
    }

    /// Returns an owned copy of the current statistics.
    #[must_use]
    pub fn snapshot(&self) -> GlobalStats {
        self.stats.lock().snapshot()
    }

    /// Subscribes to capture notifications.
    pub fn subscribe(&self) -> Receiver<CaptureEvent> {
        self.events_tx.subscribe()
    }

    #[must_use]
    pub const fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

impl Default for CaptureAggregator {
    fn default() -> Self {
        Self::without_reporting()
    }
}
