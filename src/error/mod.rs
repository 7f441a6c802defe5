//! Calculator error taxonomy, normalization and reporting.
//!
//! Every calculator failure is an [`ErrorRecord`]; [`normalize`] forces
//! foreign failures into that taxonomy and [`ErrorReporter`] logs records
//! by severity.

pub mod normalizer;
pub mod operational;
pub mod taxonomy;

pub use {
    normalizer::normalize,
    operational::{ErrorReporter, ResultExt, Severity},
    taxonomy::{ErrorDetail, ErrorKind, ErrorRecord, Operand, format_number},
};
