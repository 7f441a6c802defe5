//! Calcguard command line entry point.
//!
//! Evaluates `calcguard <a> <operator> <b>` through the calculator's
//! validation flow, prints what the page would display, and dumps the
//! capture statistics.

use std::{env::args, panic::take_hook, sync::Arc};

use {
    serde_json::to_string_pretty, tokio::task::JoinHandle, tracing::debug,
    tracing_subscriber::EnvFilter,
};

use calcguard::{
    calculator::{present, validate},
    capture::{CaptureAggregator, ChannelReportSink, install_panic_hook},
    config::SettingsManager,
    error::{ErrorReporter, ResultExt},
};

/// Main entry point for the calcguard CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings_manager = SettingsManager::new().add_context("Failed to load capture settings")?;
    let settings = settings_manager.get_settings().clone();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let (sink, dispatcher) = ChannelReportSink::new(settings.report_queue_capacity);
    let dispatcher = tokio::spawn(dispatcher.with_endpoint(settings.report_endpoint.clone()).run());
    let aggregator = Arc::new(CaptureAggregator::new(settings.capture_config(), Arc::new(sink)));
    install_panic_hook(Arc::clone(&aggregator));

    let arguments: Vec<String> = args().skip(1).collect();
    let [raw_a, operator, raw_b] = arguments.as_slice() else {
        eprintln!("Usage: calcguard <a> <operator> <b>");
        return shutdown(aggregator, dispatcher).await;
    };

    let outcome = validate(raw_a, raw_b, operator);
    if let Err(record) = &outcome {
        ErrorReporter::report(record, "calculator form");
    }

    let presentation = present(&outcome);
    println!(
        "[{}] {}: {}",
        presentation.category.style_class(),
        presentation.title,
        presentation.message
    );
    let stats = to_string_pretty(&aggregator.snapshot())
        .add_context("Failed to serialize capture statistics")?;
    println!("{stats}");

    shutdown(aggregator, dispatcher).await
}

/// Releases every report sink and waits for queued reports to be delivered.
///
/// The panic hook holds a handle to the aggregator, and the aggregator holds
/// the sink; the dispatcher stops once both are dropped.
async fn shutdown(
    aggregator: Arc<CaptureAggregator>,
    dispatcher: JoinHandle<usize>,
) -> anyhow::Result<()> {
    drop(take_hook());
    drop(aggregator);

    let delivered = dispatcher
        .await
        .add_context("Report dispatcher terminated abnormally")?;
    debug!(delivered, "Error reports flushed");
    Ok(())
}
