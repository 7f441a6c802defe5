//! Operational error context propagation and severity-aware reporting.
//!
//! This module provides the `anyhow` context extension used at the binary's
//! edges and a centralized reporter that logs calculator failures at a
//! level matching their severity.

use std::{error::Error as StdError, fmt::Display};

use {
    anyhow::{Context, Result as AnyhowResult},
    serde::Serialize,
    tracing::{error, info, warn},
};

use crate::error::taxonomy::{ErrorKind, ErrorRecord};

/// Extension trait for enhanced error context.
pub trait ResultExt<T, E> {
    /// Adds context to an error with a static string.
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;

    /// Adds context to an error with a formatted string.
    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(context)
    }

    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(format.to_string())
    }
}

/// How serious a calculator failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// The user typed something we cannot use.
    Info,
    /// The request was well-formed but cannot be computed.
    Warning,
    /// The computation itself failed.
    Error,
    /// A failure outside the taxonomy reached the calculator.
    Critical,
}

impl Severity {
    /// Severity assigned to records of `kind`.
    #[must_use]
    pub const fn for_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidInput => Self::Info,
            ErrorKind::DivisionByZero | ErrorKind::UnsupportedOperation => Self::Warning,
            ErrorKind::Overflow | ErrorKind::Mathematical | ErrorKind::Base => Self::Error,
            ErrorKind::Wrapped => Self::Critical,
        }
    }
}

/// Centralized logging of calculator failures.
pub struct ErrorReporter;

impl ErrorReporter {
    /// Logs `record` at the level matching its severity.
    ///
    /// # Arguments
    ///
    /// * `record` - The failure to log.
    /// * `context` - Where the failure was observed.
    ///
    /// # Returns
    ///
    /// The severity the record was logged with.
    pub fn report(record: &ErrorRecord, context: &str) -> Severity {
        let severity = Severity::for_kind(record.kind());
        let kind = record.kind().name();
        match severity {
            Severity::Info => info!(context, kind, "{}", record.render()),
            Severity::Warning => warn!(context, kind, "{}", record.render()),
            Severity::Error => error!(context, kind, "{}", record.render()),
            Severity::Critical => {
                let cause = record.cause().map(|c| format!("{c:#}")).unwrap_or_default();
                error!(context, kind, cause = %cause, "{}", record.render());
            }
        }
        severity
    }
}

#[cfg(test)]
mod tests {
    use std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
    };

    use anyhow::anyhow;

    use crate::error::{
        normalizer::normalize,
        operational::{ErrorReporter, ResultExt, Severity},
        taxonomy::{ErrorKind, ErrorRecord},
    };

    #[derive(Debug)]
    struct TestError;

    impl Display for TestError {
        fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
            write!(f, "Test error")
        }
    }

    impl Error for TestError {}

    #[test]
    fn test_result_ext_with_context() {
        let result: Result<i32, TestError> = Err(TestError);
        let error = result.add_context("Additional context").unwrap_err();
        assert!(error.to_string().contains("Additional context"));
    }

    #[test]
    fn test_result_ext_with_contextf() {
        let result: Result<i32, TestError> = Err(TestError);
        let error = result.add_contextf(format!("Formatted context: {}", 3)).unwrap_err();
        assert!(error.to_string().contains("Formatted context: 3"));
    }

    #[test]
    fn test_severity_ordering_by_kind() {
        assert_eq!(Severity::for_kind(ErrorKind::InvalidInput), Severity::Info);
        assert_eq!(Severity::for_kind(ErrorKind::DivisionByZero), Severity::Warning);
        assert_eq!(Severity::for_kind(ErrorKind::Overflow), Severity::Error);
        assert_eq!(Severity::for_kind(ErrorKind::Wrapped), Severity::Critical);
        assert!(Severity::Critical > Severity::Info);
    }

    #[test]
    fn test_report_returns_severity() {
        let unsupported = ErrorRecord::unsupported_operation("%");
        assert_eq!(ErrorReporter::report(&unsupported, "test"), Severity::Warning);

        let wrapped = normalize(anyhow!("boom"), None, Vec::new());
        assert_eq!(ErrorReporter::report(&wrapped, "test"), Severity::Critical);
    }
}
