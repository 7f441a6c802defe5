//! Wires process-level failure sources into a [`CaptureAggregator`].

use std::{future::Future, panic::set_hook, sync::Arc};

use {anyhow::Error as AnyError, tokio::task::JoinHandle, tracing::debug};

use crate::capture::{
    aggregator::CaptureAggregator,
    signal::{UncaughtException, UnhandledRejection},
};

/// Routes every panic into `aggregator` as an uncaught exception.
///
/// Replaces the current panic hook, so the default panic message is no
/// longer printed. A panic raised while the aggregator is already capturing
/// on the same thread is not captured again.
pub fn install_panic_hook(aggregator: Arc<CaptureAggregator>) {
    set_hook(Box::new(move |info| {
        let _ = aggregator.capture_uncaught(UncaughtException::from_panic(info));
    }));
    debug!("Panic capture hook installed");
}

/// Runs a fallible future in the background with nobody awaiting its result.
///
/// If the future fails, the error is routed into `aggregator` as an
/// unhandled rejection. The returned handle only signals completion.
pub fn spawn_detached<F, T, E>(aggregator: Arc<CaptureAggregator>, future: F) -> JoinHandle<()>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Into<AnyError> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(error) = future.await {
            let _ = aggregator.capture_rejection(UnhandledRejection::new(error));
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::anyhow;

    use crate::capture::{
        aggregator::CaptureAggregator, hooks::spawn_detached, signal::UNHANDLED_REJECTION_KIND,
    };

    #[tokio::test]
    async fn test_detached_failure_is_a_rejection() {
        let aggregator = Arc::new(CaptureAggregator::without_reporting());

        spawn_detached(Arc::clone(&aggregator), async { Err::<(), _>(anyhow!("lost")) })
            .await
            .unwrap();
        spawn_detached(Arc::clone(&aggregator), async { Ok::<_, anyhow::Error>(5) })
            .await
            .unwrap();

        let stats = aggregator.snapshot();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.type_counts.get(UNHANDLED_REJECTION_KIND), Some(&1));
        assert!(stats.recent_history.is_empty());
    }
}
