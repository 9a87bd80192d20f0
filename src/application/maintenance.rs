//! Periodic background tasks

use crate::domain::call::CallStateMachine;
use metrics::gauge;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Remove calls stuck in `PROCESSING_REQUEST` for longer than `max_age`,
/// checking every `every`
pub fn spawn_stale_call_sweeper(
    calls: CallStateMachine,
    max_age: Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let swept = calls.sweep_stale(max_age).await;
            if !swept.is_empty() {
                info!("Stale call sweep removed {} calls", swept.len());
            }
        }
    })
}

/// Publish the registry size as the `active_calls` gauge
pub fn spawn_active_calls_gauge(calls: CallStateMachine, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            gauge!("active_calls").set(calls.count_calls().await as f64);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::CallState;

    #[tokio::test]
    async fn test_sweeper_removes_stalled_calls() {
        let calls = CallStateMachine::new();
        calls.create_call("stuck", "u1", "+1555").await.unwrap();
        calls.update_state("stuck", CallState::CallStarted).await.unwrap();
        calls
            .update_state("stuck", CallState::AwaitingIntent)
            .await
            .unwrap();
        calls
            .update_state("stuck", CallState::ProcessingRequest)
            .await
            .unwrap();
        calls.create_call("idle", "u2", "+1556").await.unwrap();

        // Timestamps have second resolution
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let handle =
            spawn_stale_call_sweeper(calls.clone(), Duration::ZERO, Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(calls.get_call("stuck").await.is_err());
        assert!(calls.get_call("idle").await.is_ok());
    }
}
