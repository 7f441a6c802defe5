//! Calculator form semantics.
//!
//! This module validates a form submission into a result or an
//! [`crate::error::ErrorRecord`], and maps either outcome to what the page
//! displays.

pub mod operator;
pub mod presentation;
pub mod validation;

pub use {
    operator::Operator,
    presentation::{DisplayCategory, Presentation, present, present_error, present_failure},
    validation::{EMPTY_INPUT_MARKER, MAX_SAFE_INTEGER, validate},
};
