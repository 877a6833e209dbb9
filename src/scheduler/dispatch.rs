//! Dispatcher - Runs queued pass requests on worker tasks.
//!
//! Each request gets its own task, so passes for different frequencies run side
//! by side. A semaphore caps how many run at once; while every permit is taken
//! the dispatcher stops reading and requests wait in the queue. Once the queue
//! is closed and empty, the dispatcher waits for running passes and exits.

use super::jobs::PassRequest;
use crate::{core::pass::PassReport, errors::Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::{
    sync::{Semaphore, mpsc},
    task::{JoinHandle, JoinSet},
};
use tracing::{debug, error, info};

/// What a handler did with a request.
#[derive(Debug, Clone)]
pub enum PassOutcome {
    /// The pass ran
    Completed(PassReport),
    /// The period had already been handled
    Skipped {
        /// Period that was already claimed
        period_key: String,
    },
}

/// Executes pass requests taken off the queue.
#[async_trait]
pub trait PassHandler: Send + Sync {
    /// Handles one request. Errors are logged by the dispatcher and not retried.
    async fn handle(&self, request: PassRequest) -> Result<PassOutcome>;
}

/// Spawns the dispatcher over `queue`, running at most `worker_limit` passes at once.
pub fn spawn_dispatcher(
    handler: Arc<dyn PassHandler>,
    mut queue: mpsc::Receiver<PassRequest>,
    worker_limit: usize,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let permits = Arc::new(Semaphore::new(worker_limit.max(1)));
        let mut workers = JoinSet::new();

        while let Some(request) = queue.recv().await {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };
            // Reap finished workers so the set does not grow without bound
            while workers.try_join_next().is_some() {}

            let handler = Arc::clone(&handler);
            debug!(job = %request.job, frequency = %request.frequency, "Dispatching pass");
            workers.spawn(async move {
                let _permit = permit;
                let job = request.job.clone();
                match handler.handle(request).await {
                    Ok(PassOutcome::Completed(report)) => info!(
                        job = %job,
                        created = report.transactions_created,
                        failed = report.failures.len(),
                        "Pass completed"
                    ),
                    Ok(PassOutcome::Skipped { period_key }) => {
                        info!(job = %job, %period_key, "Pass skipped, period already handled");
                    }
                    Err(e) => error!(job = %job, error = %e, "Pass failed"),
                }
            });
        }

        while workers.join_next().await.is_some() {}
        debug!("Dispatcher drained");
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::Frequency;
    use crate::errors::Error;
    use chrono::{Datelike, TimeZone, Utc};
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::Duration;

    /// Records requests and how many were in flight at once.
    #[derive(Default)]
    struct RecordingHandler {
        seen: Mutex<Vec<PassRequest>>,
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl PassHandler for RecordingHandler {
        async fn handle(&self, request: PassRequest) -> Result<PassOutcome> {
            let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now_running, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(5)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);

            let date = request.fired_at.date_naive();
            self.seen.lock().unwrap().push(request);
            if date.day0() == 0 {
                return Err(Error::Config {
                    message: "first of the month".to_string(),
                });
            }
            Ok(PassOutcome::Skipped {
                period_key: date.to_string(),
            })
        }
    }

    fn request(frequency: Frequency, day: u32) -> PassRequest {
        PassRequest {
            job: frequency.to_string().to_lowercase(),
            frequency,
            fired_at: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_limit_caps_concurrency() {
        let handler = Arc::new(RecordingHandler::default());
        let (tx, rx) = mpsc::channel(16);
        let dispatcher = spawn_dispatcher(handler.clone(), rx, 2);

        for day in 2..7 {
            tx.send(request(Frequency::Daily, day)).await.unwrap();
        }
        drop(tx);
        dispatcher.await.unwrap();

        assert_eq!(handler.seen.lock().unwrap().len(), 5);
        assert_eq!(handler.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_pass_does_not_stop_dispatcher() {
        let handler = Arc::new(RecordingHandler::default());
        let (tx, rx) = mpsc::channel(16);
        let dispatcher = spawn_dispatcher(handler.clone(), rx, 4);

        tx.send(request(Frequency::Monthly, 1)).await.unwrap();
        tx.send(request(Frequency::Annual, 1)).await.unwrap();
        tx.send(request(Frequency::Biweekly, 15)).await.unwrap();
        drop(tx);
        dispatcher.await.unwrap();

        let seen = handler.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        // Different frequencies ran side by side
        assert_eq!(handler.peak.load(Ordering::SeqCst), 3);
    }
}
