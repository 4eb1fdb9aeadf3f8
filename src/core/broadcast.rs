//! Admin broadcast engine
//!
//! Sends one message to every known user, one recipient at a time, paced by a
//! fixed-interval ticker. A failed delivery is counted and the run continues.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::time::{interval, MissedTickBehavior};

use crate::core::config;
use crate::core::error::AppResult;
use crate::core::metrics;

/// Outbound side of a broadcast
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Delivers `text` to one recipient
    async fn deliver(&self, user_id: i64, text: &str) -> AppResult<()>;

    /// Reports progress to whoever started the broadcast. Must not fail the run.
    async fn progress(&self, processed: usize, total: usize);
}

/// A confirmed broadcast ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastJob {
    pub text: String,
    pub recipients: Vec<i64>,
}

/// Aggregate result of a finished broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_secs: u64,
}

/// True when progress should be reported after `processed` recipients
pub fn is_progress_point(processed: usize, total: usize) -> bool {
    processed % config::broadcast::PROGRESS_EVERY == 0 || processed == total
}

/// Runs a broadcast to completion.
///
/// Recipients are attempted sequentially in the given order; the ticker waits `send_interval`
/// between consecutive sends and yields to the runtime while doing so.
pub async fn run_broadcast<M>(job: &BroadcastJob, messenger: &M, send_interval: Duration) -> BroadcastReport
where
    M: Messenger + ?Sized,
{
    let started = Instant::now();
    let total = job.recipients.len();
    let mut succeeded = 0;
    let mut failed = 0;

    log::info!("Broadcast started: {} recipients", total);

    let mut ticker = interval(send_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for (idx, &user_id) in job.recipients.iter().enumerate() {
        ticker.tick().await;

        match messenger.deliver(user_id, &job.text).await {
            Ok(()) => {
                succeeded += 1;
                metrics::record_delivery(true);
            }
            Err(e) => {
                failed += 1;
                metrics::record_delivery(false);
                log::debug!("Broadcast delivery to {} failed: {}", user_id, e);
            }
        }

        let processed = idx + 1;
        if is_progress_point(processed, total) {
            messenger.progress(processed, total).await;
        }
    }

    let report = BroadcastReport {
        attempted: total,
        succeeded,
        failed,
        elapsed_secs: started.elapsed().as_secs(),
    };

    log::info!(
        "Broadcast finished: {} ok, {} failed, {}s",
        report.succeeded,
        report.failed,
        report.elapsed_secs
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMessenger {
        failing: Vec<i64>,
        attempts: Mutex<Vec<i64>>,
        progress: Mutex<Vec<(usize, usize)>>,
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn deliver(&self, user_id: i64, _text: &str) -> AppResult<()> {
            self.attempts.lock().unwrap().push(user_id);
            if self.failing.contains(&user_id) {
                return Err(AppError::Anyhow(anyhow::anyhow!("Forbidden: bot was blocked by the user")));
            }
            Ok(())
        }

        async fn progress(&self, processed: usize, total: usize) {
            self.progress.lock().unwrap().push((processed, total));
        }
    }

    fn job(recipients: Vec<i64>) -> BroadcastJob {
        BroadcastJob {
            text: "hello".to_string(),
            recipients,
        }
    }

    #[tokio::test]
    async fn test_failed_recipient_does_not_halt_run() {
        let messenger = RecordingMessenger {
            failing: vec![2],
            ..Default::default()
        };

        let report = run_broadcast(&job(vec![1, 2, 3]), &messenger, Duration::from_millis(1)).await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(*messenger.attempts.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_progress_cadence() {
        let messenger = RecordingMessenger::default();
        let recipients: Vec<i64> = (1..=60).collect();

        run_broadcast(&job(recipients), &messenger, Duration::from_millis(1)).await;

        assert_eq!(*messenger.progress.lock().unwrap(), vec![(25, 60), (50, 60), (60, 60)]);
    }

    #[tokio::test]
    async fn test_progress_not_duplicated_on_exact_multiple() {
        let messenger = RecordingMessenger::default();
        let recipients: Vec<i64> = (1..=25).collect();

        run_broadcast(&job(recipients), &messenger, Duration::from_millis(1)).await;

        assert_eq!(*messenger.progress.lock().unwrap(), vec![(25, 25)]);
    }

    #[tokio::test]
    async fn test_empty_recipient_list() {
        let messenger = RecordingMessenger::default();

        let report = run_broadcast(&job(vec![]), &messenger, Duration::from_millis(1)).await;

        assert_eq!(report.attempted, 0);
        assert_eq!(report.succeeded + report.failed, 0);
        assert!(messenger.progress.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sends_are_paced() {
        let messenger = RecordingMessenger::default();
        let started = Instant::now();

        run_broadcast(&job(vec![1, 2, 3]), &messenger, Duration::from_millis(20)).await;

        // first tick fires immediately, the remaining two wait a full interval each
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_is_progress_point() {
        assert!(!is_progress_point(1, 3));
        assert!(is_progress_point(3, 3));
        assert!(is_progress_point(25, 100));
        assert!(!is_progress_point(26, 100));
    }
}
