//! Closed taxonomy of calculator error variants.
//!
//! Every failure the calculator surfaces is materialized as an [`ErrorRecord`].
//! A record's [`ErrorKind`] is fixed at construction and determines which
//! kind-specific payload ([`ErrorDetail`]) it carries. Kinds form a shallow
//! "is-a" lattice: every kind is a [`ErrorKind::Base`], and
//! [`ErrorKind::Overflow`] is additionally a [`ErrorKind::Mathematical`].

use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
};

use {
    anyhow::Error as AnyError,
    chrono::{DateTime, Utc},
    serde::Serialize,
};

/// Operation label used by division-by-zero records unless overridden.
pub const DEFAULT_DIVISION_OPERATION: &str = "division";

/// Discriminant of an [`ErrorRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Generic calculator failure, root of the lattice.
    Base,
    /// Division with a zero divisor.
    DivisionByZero,
    /// Raw input that could not be interpreted.
    InvalidInput,
    /// Generic arithmetic failure.
    Mathematical,
    /// Result outside the representable range.
    Overflow,
    /// Operator symbol outside the supported set.
    UnsupportedOperation,
    /// Foreign failure wrapped into the taxonomy.
    Wrapped,
}

impl ErrorKind {
    /// All kinds, in declaration order.
    pub const ALL: [ErrorKind; 7] = [
        Self::Base,
        Self::DivisionByZero,
        Self::InvalidInput,
        Self::Mathematical,
        Self::Overflow,
        Self::UnsupportedOperation,
        Self::Wrapped,
    ];

    /// Name used when rendering and classifying records of this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Base => "CalculatorError",
            Self::DivisionByZero => "DivisionByZeroError",
            Self::InvalidInput => "InvalidInputError",
            Self::Mathematical => "MathematicalError",
            Self::Overflow => "OverflowError",
            Self::UnsupportedOperation => "UnsupportedOperationError",
            Self::Wrapped => "WrappedCalculatorError",
        }
    }

    /// Immediate superkind, `None` for [`ErrorKind::Base`].
    #[must_use]
    pub const fn parent(self) -> Option<ErrorKind> {
        match self {
            Self::Base => None,
            Self::Overflow => Some(Self::Mathematical),
            Self::DivisionByZero
            | Self::InvalidInput
            | Self::Mathematical
            | Self::UnsupportedOperation
            | Self::Wrapped => Some(Self::Base),
        }
    }

    /// Returns `true` if `self` is `ancestor` or derives from it.
    ///
    /// This is a static table lookup; it agrees with walking [`Self::parent`].
    #[must_use]
    pub const fn is_a(self, ancestor: ErrorKind) -> bool {
        matches!(
            (self, ancestor),
            (_, Self::Base)
                | (Self::DivisionByZero, Self::DivisionByZero)
                | (Self::InvalidInput, Self::InvalidInput)
                | (Self::Mathematical | Self::Overflow, Self::Mathematical)
                | (Self::Overflow, Self::Overflow)
                | (Self::UnsupportedOperation, Self::UnsupportedOperation)
                | (Self::Wrapped, Self::Wrapped)
        )
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// A value involved in a failed operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    /// Parsed numeric operand.
    Number(f64),
    /// Raw textual operand that never became a number.
    Text(String),
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Number(value) => f.write_str(&format_number(*value)),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Formats a number the way the calculator page displays it.
///
/// Integral values carry no fractional part, zero has no sign, magnitudes
/// of at least 1e21 or below 1e-6 use exponent form (`1e+21`, `1.5e-7`) and
/// non-finite values use `Infinity`, `-Infinity` and `NaN`.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if value == 0.0 {
        "0".to_string()
    } else if value.abs() >= 1e21 || value.abs() < 1e-6 {
        let exponent_form = format!("{value:e}");
        match exponent_form.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => exponent_form,
        }
    } else {
        value.to_string()
    }
}

/// Kind-specific payload of an [`ErrorRecord`].
#[derive(Debug)]
pub enum ErrorDetail {
    /// No extra fields.
    Base,
    /// The dividend that was divided by zero.
    DivisionByZero { dividend: f64 },
    /// The rejected raw input and a label for what was expected instead.
    InvalidInput { input: String, expected_type: String },
    /// No extra fields.
    Mathematical,
    /// The out-of-range result.
    Overflow { result: f64 },
    /// The unsupported operator symbol.
    UnsupportedOperation { operator: String },
    /// The original failure, owned exclusively by this record.
    Wrapped { cause: AnyError },
}

impl ErrorDetail {
    /// The kind this payload belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Base => ErrorKind::Base,
            Self::DivisionByZero { .. } => ErrorKind::DivisionByZero,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Mathematical => ErrorKind::Mathematical,
            Self::Overflow { .. } => ErrorKind::Overflow,
            Self::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            Self::Wrapped { .. } => ErrorKind::Wrapped,
        }
    }
}

/// A calculator failure with its structured context.
///
/// Fields are private so a record cannot change kind or timestamp after
/// construction.
#[derive(Debug)]
pub struct ErrorRecord {
    message: String,
    operation: Option<String>,
    operands: Vec<Operand>,
    timestamp: DateTime<Utc>,
    detail: ErrorDetail,
}

impl ErrorRecord {
    fn with_detail(
        message: String,
        operation: Option<&str>,
        operands: Vec<Operand>,
        detail: ErrorDetail,
    ) -> Self {
        Self {
            message,
            operation: operation.map(str::to_string),
            operands,
            timestamp: Utc::now(),
            detail,
        }
    }

    /// Creates a generic [`ErrorKind::Base`] record.
    pub fn new(
        message: impl Into<String>,
        operation: Option<&str>,
        operands: Vec<Operand>,
    ) -> Self {
        Self::with_detail(message.into(), operation, operands, ErrorDetail::Base)
    }

    /// Creates a division-by-zero record labelled with the default operation.
    pub fn division_by_zero(dividend: f64) -> Self {
        Self::division_by_zero_in(dividend, DEFAULT_DIVISION_OPERATION)
    }

    /// Creates a division-by-zero record for a named operation.
    ///
    /// Operands are always `[dividend, 0]`.
    pub fn division_by_zero_in(dividend: f64, operation: &str) -> Self {
        Self::with_detail(
            format!("Cannot divide {} by zero", format_number(dividend)),
            Some(operation),
            vec![Operand::Number(dividend), Operand::Number(0.0)],
            ErrorDetail::DivisionByZero { dividend },
        )
    }

    /// Creates an invalid-input record.
    ///
    /// # Arguments
    ///
    /// * `input` - The rejected raw input.
    /// * `expected_type` - Label describing what was expected, e.g. `"number"`.
    pub fn invalid_input(input: impl Into<String>, expected_type: impl Into<String>) -> Self {
        let input = input.into();
        let expected_type = expected_type.into();
        Self::with_detail(
            format!("Invalid input: \"{input}\" is not a valid {expected_type}"),
            None,
            vec![Operand::Text(input.clone())],
            ErrorDetail::InvalidInput {
                input,
                expected_type,
            },
        )
    }

    /// Creates a generic arithmetic-failure record.
    pub fn mathematical(
        message: impl Into<String>,
        operation: Option<&str>,
        operands: Vec<Operand>,
    ) -> Self {
        Self::with_detail(message.into(), operation, operands, ErrorDetail::Mathematical)
    }

    /// Creates an overflow record for an out-of-range result.
    pub fn overflow(result: f64, operation: Option<&str>, operands: Vec<Operand>) -> Self {
        Self::with_detail(
            format!("Result overflow: {}", format_number(result)),
            operation,
            operands,
            ErrorDetail::Overflow { result },
        )
    }

    /// Creates a record for an operator outside the supported set.
    pub fn unsupported_operation(operator: impl Into<String>) -> Self {
        let operator = operator.into();
        Self::with_detail(
            format!("Unsupported operation: \"{operator}\""),
            None,
            Vec::new(),
            ErrorDetail::UnsupportedOperation { operator },
        )
    }

    /// Wraps a foreign failure. Only the normalizer builds these.
    pub(crate) fn wrapped(
        cause: AnyError,
        operation: Option<&str>,
        operands: Vec<Operand>,
    ) -> Self {
        Self::with_detail(
            format!("Calculator operation failed: {cause}"),
            operation,
            operands,
            ErrorDetail::Wrapped { cause },
        )
    }

    /// The record's kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.detail.kind()
    }

    /// Returns `true` if this record is of `kind` or a kind derived from it.
    #[must_use]
    pub const fn is_a(&self, kind: ErrorKind) -> bool {
        self.kind().is_a(kind)
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    #[must_use]
    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub const fn detail(&self) -> &ErrorDetail {
        &self.detail
    }

    /// The wrapped failure, if this is a [`ErrorKind::Wrapped`] record.
    #[must_use]
    pub fn cause(&self) -> Option<&AnyError> {
        match &self.detail {
            ErrorDetail::Wrapped { cause } => Some(cause),
            _ => None,
        }
    }

    /// Renders the record as
    /// `"{kind}: {message} [Operation: {operation}, Operands: {operands}]"`.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl Display for ErrorRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}: {} [Operation: {}, Operands: ",
            self.kind().name(),
            self.message,
            self.operation.as_deref().unwrap_or("null"),
        )?;
        for (index, operand) in self.operands.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{operand}")?;
        }
        f.write_str("]")
    }
}

impl StdError for ErrorRecord {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.detail {
            ErrorDetail::Wrapped { cause } => Some(&**cause),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::error::taxonomy::{ErrorDetail, ErrorKind, ErrorRecord, Operand, format_number};

    fn walks_to(kind: ErrorKind, ancestor: ErrorKind) -> bool {
        let mut current = Some(kind);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = k.parent();
        }
        false
    }

    #[test]
    fn test_is_a_table_matches_parent_chain() {
        for kind in ErrorKind::ALL {
            for ancestor in ErrorKind::ALL {
                assert_eq!(
                    kind.is_a(ancestor),
                    walks_to(kind, ancestor),
                    "{kind} is-a {ancestor}"
                );
            }
        }
    }

    #[test]
    fn test_overflow_lattice() {
        let overflow = ErrorRecord::overflow(f64::INFINITY, Some("*"), vec![]);
        assert!(overflow.is_a(ErrorKind::Overflow));
        assert!(overflow.is_a(ErrorKind::Mathematical));
        assert!(overflow.is_a(ErrorKind::Base));

        let unsupported = ErrorRecord::unsupported_operation("%");
        assert!(unsupported.is_a(ErrorKind::Base));
        assert!(!unsupported.is_a(ErrorKind::Mathematical));

        let math = ErrorRecord::mathematical("bad", None, vec![]);
        assert!(!math.is_a(ErrorKind::Overflow));
    }

    #[test]
    fn test_division_by_zero_record() {
        let record = ErrorRecord::division_by_zero(10.0);
        assert_eq!(record.kind(), ErrorKind::DivisionByZero);
        assert_eq!(record.message(), "Cannot divide 10 by zero");
        assert_eq!(record.operation(), Some("division"));
        assert_eq!(
            record.operands(),
            &[Operand::Number(10.0), Operand::Number(0.0)]
        );
        assert!(matches!(
            record.detail(),
            ErrorDetail::DivisionByZero { dividend } if *dividend == 10.0
        ));
        assert_eq!(
            record.render(),
            "DivisionByZeroError: Cannot divide 10 by zero [Operation: division, Operands: 10,0]"
        );
    }

    #[test]
    fn test_invalid_input_record() {
        let record = ErrorRecord::invalid_input("abc", "number");
        assert_eq!(record.message(), "Invalid input: \"abc\" is not a valid number");
        assert_eq!(record.operation(), None);
        assert_eq!(record.operands(), &[Operand::Text("abc".to_string())]);
        assert_eq!(
            record.to_string(),
            "InvalidInputError: Invalid input: \"abc\" is not a valid number [Operation: null, Operands: abc]"
        );
    }

    #[test]
    fn test_overflow_and_unsupported_messages() {
        let overflow =
            ErrorRecord::overflow(f64::INFINITY, Some("*"), vec![2.0.into(), 3.5.into()]);
        assert_eq!(overflow.message(), "Result overflow: Infinity");
        assert_eq!(
            overflow.render(),
            "OverflowError: Result overflow: Infinity [Operation: *, Operands: 2,3.5]"
        );

        let unsupported = ErrorRecord::unsupported_operation("%");
        assert_eq!(unsupported.message(), "Unsupported operation: \"%\"");
        assert!(unsupported.operands().is_empty());
        assert_eq!(
            unsupported.render(),
            "UnsupportedOperationError: Unsupported operation: \"%\" [Operation: null, Operands: ]"
        );
    }

    #[test]
    fn test_base_record_has_no_cause() {
        let record = ErrorRecord::new("something broke", None, Vec::new());
        assert_eq!(record.kind(), ErrorKind::Base);
        assert!(record.cause().is_none());
        assert!(std::error::Error::source(&record).is_none());
        assert_eq!(
            record.render(),
            "CalculatorError: something broke [Operation: null, Operands: ]"
        );
    }

    #[test]
    fn test_timestamp_set_at_construction() {
        let before = Utc::now();
        let record = ErrorRecord::unsupported_operation("^");
        let after = Utc::now();
        assert!(record.timestamp() >= before && record.timestamp() <= after);
        assert_eq!(record.timestamp(), record.timestamp());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(7.0), "7");
        assert_eq!(format_number(-0.25), "-0.25");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn test_format_number_zero_and_exponent_forms() {
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1e308), "1e+308");
        assert_eq!(format_number(-2.5e22), "-2.5e+22");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(0.000001), "0.000001");
    }

    #[test]
    fn test_negative_zero_dividend_renders_unsigned() {
        let record = ErrorRecord::division_by_zero(-0.0);
        assert_eq!(
            record.render(),
            "DivisionByZeroError: Cannot divide 0 by zero [Operation: division, Operands: 0,0]"
        );
    }

    #[test]
    fn test_kind_names_are_distinct() {
        let mut names: Vec<_> = ErrorKind::ALL.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ErrorKind::ALL.len());
        assert_eq!(ErrorKind::Wrapped.name(), "WrappedCalculatorError");
    }
}
