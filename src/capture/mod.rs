//! Capture of failures that escape all local handling.
//!
//! This module provides the process-scoped [`CaptureAggregator`], the two
//! signal types it consumes, the injected reporting capability, and hooks
//! that connect panics and detached tasks to the aggregator.


pub mod aggregator;
pub mod hooks;
pub mod reporter;
pub mod signal;

pub use {
    aggregator::{
        CaptureAggregator, CaptureConfig, CaptureEvent, DEFAULT_HISTORY_LIMIT, GlobalStats,
        HistoryEntry,
    },
    hooks::{install_panic_hook, spawn_detached},
    reporter::{
        ChannelReportSink, DisabledSink, ErrorReport, ReportContext, ReportDispatcher,
        ReportError, ReportSink,
    },
    signal::{CaptureOutcome, UncaughtException, UnhandledRejection},
};
