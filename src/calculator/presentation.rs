//! Maps calculation outcomes to user-facing messages and styling.

use {anyhow::Error as AnyError, serde::Serialize};

use crate::error::{
    normalizer::normalize,
    operational::Severity,
    taxonomy::{ErrorDetail, ErrorRecord, format_number},
};

/// Display category of a calculation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DisplayCategory {
    Success,
    DivisionByZero,
    InvalidInput,
    Overflow,
    Unsupported,
    Calculation,
    Unexpected,
}

impl DisplayCategory {
    /// Style class applied to the result area.
    #[must_use]
    pub const fn style_class(self) -> &'static str {
        match self {
            Self::Success => "result-success",
            Self::DivisionByZero => "error-division",
            Self::InvalidInput => "error-input",
            Self::Overflow => "error-overflow",
            Self::Unsupported => "error-unsupported",
            Self::Calculation => "error-calculation",
            Self::Unexpected => "error-unexpected",
        }
    }

    /// Severity of the category, `None` for success.
    #[must_use]
    pub const fn severity(self) -> Option<Severity> {
        match self {
            Self::Success => None,
            Self::InvalidInput => Some(Severity::Info),
            Self::DivisionByZero | Self::Unsupported => Some(Severity::Warning),
            Self::Overflow | Self::Calculation => Some(Severity::Error),
            Self::Unexpected => Some(Severity::Critical),
        }
    }
}

/// What the page shows for an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Presentation {
    /// Display category, which selects the styling.
    pub category: DisplayCategory,
    /// Short heading.
    pub title: String,
    /// Body text.
    pub message: String,
}

impl Presentation {
    fn new(category: DisplayCategory, title: &str, message: String) -> Self {
        Self {
            category,
            title: title.to_string(),
            message,
        }
    }
}

/// Presents the outcome of [`crate::calculator::validate`].
#[must_use]
pub fn present(outcome: &Result<f64, ErrorRecord>) -> Presentation {
    match outcome {
        Ok(result) => Presentation::new(
            DisplayCategory::Success,
            "Result",
            format!("Result: {}", format_number(*result)),
        ),
        Err(record) => present_error(record),
    }
}

/// Presents a failed calculation, most specific kind first.
#[must_use]
pub fn present_error(record: &ErrorRecord) -> Presentation {
    match record.detail() {
        ErrorDetail::DivisionByZero { dividend } => Presentation::new(
            DisplayCategory::DivisionByZero,
            "Division by zero",
            format!(
                "You tried to divide {} by zero. Please choose a non-zero divisor.",
                format_number(*dividend)
            ),
        ),
        ErrorDetail::InvalidInput {
            input,
            expected_type,
        } => Presentation::new(
            DisplayCategory::InvalidInput,
            "Invalid input",
            format!("\"{input}\" is not a valid {expected_type}. Please check your entry."),
        ),
        ErrorDetail::Overflow { result } => Presentation::new(
            DisplayCategory::Overflow,
            "Result too large",
            format!(
                "The result ({}) is outside the range the calculator can display.",
                format_number(*result)
            ),
        ),
        ErrorDetail::UnsupportedOperation { operator } => Presentation::new(
            DisplayCategory::Unsupported,
            "Unsupported operation",
            format!("The operator \"{operator}\" is not supported. Use +, -, * or /."),
        ),
        ErrorDetail::Mathematical | ErrorDetail::Base => Presentation::new(
            DisplayCategory::Calculation,
            "Calculation error",
            record.message().to_string(),
        ),
        ErrorDetail::Wrapped { .. } => Presentation::new(
            DisplayCategory::Unexpected,
            "Unexpected error",
            "An unexpected error occurred. Please try again.".to_string(),
        ),
    }
}

/// Presents an arbitrary failure by normalizing it first.
///
/// # Returns
///
/// The normalized record, kept for diagnostics, and its presentation.
#[must_use]
pub fn present_failure(failure: AnyError) -> (ErrorRecord, Presentation) {
    let record = normalize(failure, None, Vec::new());
    let presentation = present_error(&record);
    (record, presentation)
}
