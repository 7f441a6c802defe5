//! Calcguard - Calculator Error Classification and Capture
//!
//! Error handling for a simple calculator page: a closed taxonomy of
//! calculator failures, a normalizer that forces any failure into that
//! taxonomy, the form validation flow that produces those failures, and a
//! process-scoped aggregator for exceptions and rejections nobody handled.

pub mod calculator;
pub mod capture;
pub mod config;
pub mod error;

// Re-export key types for convenience
pub use {
    calculator::{DisplayCategory, Operator, Presentation, present, validate},
    capture::{
        CaptureAggregator, CaptureConfig, CaptureOutcome, GlobalStats, ReportSink,
        UncaughtException, UnhandledRejection,
    },
    config::{CaptureSettings, SettingsManager},
    error::{ErrorKind, ErrorRecord, ErrorReporter, Operand, normalize},
};
