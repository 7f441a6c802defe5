//! Signals delivered to the capture aggregator.

use std::{
    any::{Any, type_name},
    error::Error as StdError,
    panic::PanicHookInfo,
};

use anyhow::Error as AnyError;

use crate::error::taxonomy::ErrorRecord;

/// Classification used when a signal carries no failure object.
pub const UNKNOWN_KIND: &str = "Unknown";

/// Classification of every unhandled rejection.
pub const UNHANDLED_REJECTION_KIND: &str = "UnhandledPromiseRejection";

/// Classification of panics whose payload is not an [`ErrorRecord`].
pub const PANIC_KIND: &str = "Panic";

/// What the capture handler tells the host about a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The exception was handled; default surfacing is suppressed.
    Handled,
    /// The rejection was acknowledged; it will not be surfaced again.
    Acknowledged,
}

/// An exception that escaped all local error handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncaughtException {
    /// Failure message.
    pub message: String,
    /// Source file or URL the failure was raised from.
    pub source: Option<String>,
    /// Line in `source`.
    pub line: Option<u32>,
    /// Column in `source`.
    pub column: Option<u32>,
    /// Concrete kind name of the failure object, if one accompanied the signal.
    pub failure_kind: Option<String>,
}

impl UncaughtException {
    /// Creates a signal with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
            line: None,
            column: None,
            failure_kind: None,
        }
    }

    /// Attaches the source location.
    #[must_use]
    pub fn at(mut self, source: impl Into<String>, line: u32, column: u32) -> Self {
        self.source = Some(source.into());
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Attaches the failure object, recording its concrete kind.
    #[must_use]
    pub fn with_failure<E: StdError + 'static>(mut self, failure: &E) -> Self {
        self.failure_kind = Some(failure_kind_name(failure));
        self
    }

    /// Attaches an already-known failure kind.
    #[must_use]
    pub fn with_failure_kind(mut self, kind: impl Into<String>) -> Self {
        self.failure_kind = Some(kind.into());
        self
    }

    /// Kind this signal is classified under.
    #[must_use]
    pub fn kind_name(&self) -> &str {
        self.failure_kind.as_deref().unwrap_or(UNKNOWN_KIND)
    }

    /// Builds a signal from a panic.
    ///
    /// A panic raised with an [`ErrorRecord`] payload classifies under the
    /// record's kind; any other payload classifies as [`PANIC_KIND`].
    pub fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let payload = info.payload();
        let (message, kind) = match payload.downcast_ref::<ErrorRecord>() {
            Some(record) => (record.render(), record.kind().name()),
            None => (panic_message(payload), PANIC_KIND),
        };

        let signal = Self::new(message).with_failure_kind(kind);
        match info.location() {
            Some(location) => signal.at(location.file(), location.line(), location.column()),
            None => signal,
        }
    }
}

/// A fallible background computation whose failure nobody observed.
#[derive(Debug)]
pub struct UnhandledRejection {
    reason: Option<AnyError>,
}

impl UnhandledRejection {
    /// Creates a rejection carrying its reason.
    pub fn new(reason: impl Into<AnyError>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }

    /// Creates a rejection without a reason.
    #[must_use]
    pub const fn without_reason() -> Self {
        Self { reason: None }
    }

    #[must_use]
    pub fn reason(&self) -> Option<&AnyError> {
        self.reason.as_ref()
    }

    /// Human-readable reason for logs.
    #[must_use]
    pub fn reason_message(&self) -> String {
        self.reason
            .as_ref()
            .map_or_else(|| "no reason given".to_string(), ToString::to_string)
    }
}

/// Concrete kind name of a failure.
///
/// [`ErrorRecord`]s classify by their kind name, anything else by the last
/// path segment of its Rust type name.
#[must_use]
pub fn failure_kind_name<E: StdError + 'static>(failure: &E) -> String {
    let erased: &(dyn StdError + 'static) = failure;
    match erased.downcast_ref::<ErrorRecord>() {
        Some(record) => record.kind().name().to_string(),
        None => short_type_name::<E>().to_string(),
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::{io, num::ParseIntError};

    use anyhow::anyhow;

    use crate::{
        capture::signal::{
            UNKNOWN_KIND, UncaughtException, UnhandledRejection, failure_kind_name,
        },
        error::taxonomy::ErrorRecord,
    };

    #[test]
    fn test_kind_name_defaults_to_unknown() {
        let signal = UncaughtException::new("Script error.");
        assert_eq!(signal.kind_name(), UNKNOWN_KIND);
        assert!(signal.source.is_none());
    }

    #[test]
    fn test_record_failure_uses_kind_name() {
        let record = ErrorRecord::division_by_zero(4.0);
        let signal = UncaughtException::new(record.message())
            .at("app.js", 12, 5)
            .with_failure(&record);
        assert_eq!(signal.kind_name(), "DivisionByZeroError");
        assert_eq!(signal.source.as_deref(), Some("app.js"));
        assert_eq!((signal.line, signal.column), (Some(12), Some(5)));
    }

    #[test]
    fn test_foreign_failure_uses_type_name() {
        let parse_error: ParseIntError = "x".parse::<i32>().unwrap_err();
        assert_eq!(failure_kind_name(&parse_error), "ParseIntError");

        let io_error = io::Error::other("disk");
        assert_eq!(failure_kind_name(&io_error), "Error");
    }

    #[test]
    fn test_rejection_reason_message() {
        assert_eq!(
            UnhandledRejection::new(anyhow!("timed out")).reason_message(),
            "timed out"
        );
        assert_eq!(
            UnhandledRejection::without_reason().reason_message(),
            "no reason given"
        );
        assert!(UnhandledRejection::without_reason().reason().is_none());
    }
}
