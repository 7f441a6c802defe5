//! Forces arbitrary failures into the calculator taxonomy.

use {anyhow::Error as AnyError, tracing::debug};

use crate::error::taxonomy::{ErrorRecord, Operand};

/// Normalizes a failure into an [`ErrorRecord`].
///
/// A failure that already is an `ErrorRecord` is returned unchanged, with
/// its original operation, operands and timestamp. Anything else is wrapped
/// into a [`crate::error::ErrorKind::Wrapped`] record that takes ownership of
/// the failure as its cause and is labelled with `operation` and `operands`.
///
/// # Arguments
///
/// * `failure` - The failure to normalize.
/// * `operation` - Operation that was running when the failure occurred.
/// * `operands` - Values the operation was applied to.
///
/// # Returns
///
/// A record belonging to the taxonomy.
pub fn normalize(
    failure: AnyError,
    operation: Option<&str>,
    operands: Vec<Operand>,
) -> ErrorRecord {
    match failure.downcast::<ErrorRecord>() {
        Ok(record) => record,
        Err(failure) => {
            debug!(operation = ?operation, error = %failure, "Wrapping foreign failure");
            ErrorRecord::wrapped(failure, operation, operands)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
        num::ParseFloatError,
    };

    use anyhow::{Error as AnyError, anyhow};

    use crate::error::{
        normalizer::normalize,
        taxonomy::{ErrorKind, ErrorRecord, Operand},
    };

    #[derive(Debug, PartialEq)]
    struct SensorError {
        id: u32,
    }

    impl Display for SensorError {
        fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
            write!(f, "sensor {}", self.id)
        }
    }

    impl Error for SensorError {}

    #[test]
    fn test_foreign_failure_is_wrapped_with_cause() {
        let record = normalize(
            AnyError::new(SensorError { id: 7 }),
            Some("+"),
            vec![1.0.into(), 2.0.into()],
        );

        assert_eq!(record.kind(), ErrorKind::Wrapped);
        assert!(record.is_a(ErrorKind::Base));
        assert_eq!(record.message(), "Calculator operation failed: sensor 7");
        assert_eq!(record.operation(), Some("+"));
        assert_eq!(
            record.cause().and_then(|c| c.downcast_ref::<SensorError>()),
            Some(&SensorError { id: 7 })
        );
        assert_eq!(
            record.source().map(ToString::to_string),
            Some("sensor 7".to_string())
        );
        assert_eq!(
            record.render(),
            "WrappedCalculatorError: Calculator operation failed: sensor 7 [Operation: +, Operands: 1,2]"
        );
    }

    #[test]
    fn test_taxonomy_member_passes_through() {
        let original = ErrorRecord::division_by_zero(10.0);
        let timestamp = original.timestamp();

        let record = normalize(original.into(), Some("other"), vec![Operand::from("x")]);

        assert_eq!(record.kind(), ErrorKind::DivisionByZero);
        assert_eq!(record.timestamp(), timestamp);
        assert_eq!(record.operation(), Some("division"));
        assert_eq!(record.operands(), &[Operand::Number(10.0), Operand::Number(0.0)]);
    }

    #[test]
    fn test_wrapped_record_is_not_wrapped_twice() {
        let once = normalize(anyhow!("disk on fire"), Some("parsing"), Vec::new());
        let twice = normalize(once.into(), Some("/"), Vec::new());

        assert_eq!(twice.kind(), ErrorKind::Wrapped);
        assert_eq!(twice.operation(), Some("parsing"));
        assert_eq!(twice.message(), "Calculator operation failed: disk on fire");
    }

    #[test]
    fn test_std_error_is_wrapped() {
        let parse_error: ParseFloatError = "x".parse::<f64>().unwrap_err();
        let expected = parse_error.to_string();

        let record = normalize(parse_error.into(), Some("parsing"), vec!["x".into()]);

        assert_eq!(record.kind(), ErrorKind::Wrapped);
        assert_eq!(
            record.cause().map(ToString::to_string),
            Some(expected)
        );
    }
}
