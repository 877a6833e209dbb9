//! Timer tasks - One per armed job.
//!
//! A timer sleeps until its job is next due, puts a [`PassRequest`] on the queue
//! without waiting for the pass, and re-arms. When the queue is full the fire is
//! dropped with a warning rather than delaying the next one.

use super::jobs::{PassRequest, ScheduledJob};
use crate::clock::Clock;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

/// Spawns the timer task for `job`. The task ends when `shutdown` flips to
/// `true` or the queue is closed.
pub fn spawn_timer(
    job: ScheduledJob,
    clock: Arc<dyn Clock>,
    queue: mpsc::Sender<PassRequest>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_fired: Option<DateTime<Utc>> = None;

        loop {
            let now = clock.now();
            // Never fire the same instant twice, even if the clock lags behind
            let from = last_fired.map_or(now, |last| last.max(now));
            let Some(due) = job.next_fire(from) else {
                error!(job = %job.name, "Job rule never fires, timer stopped");
                return;
            };
            let wait = (due - now).to_std().unwrap_or_default();
            debug!(job = %job.name, %due, "Timer armed");

            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!(job = %job.name, "Timer stopped");
                        return;
                    }
                    continue;
                }
            }

            last_fired = Some(due);
            let request = PassRequest {
                job: job.name.clone(),
                frequency: job.frequency,
                fired_at: due,
            };
            match queue.try_send(request) {
                Ok(()) => info!(job = %job.name, frequency = %job.frequency, %due, "Job fired"),
                Err(mpsc::error::TrySendError::Full(request)) => warn!(
                    job = %request.job,
                    frequency = %request.frequency,
                    "Pass queue full, dropping fire"
                ),
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(job = %job.name, "Pass queue closed, timer stopped");
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::clock::FixedClock;
    use crate::entities::Frequency;
    use crate::scheduler::rule::CalendarRule;
    use chrono::{NaiveTime, TimeZone};
    use std::time::Duration;

    fn daily() -> ScheduledJob {
        ScheduledJob {
            name: "daily".to_string(),
            frequency: Frequency::Daily,
            rule: CalendarRule::Day,
            at: NaiveTime::MIN,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_at_next_midnight_and_rearms() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 0).unwrap());
        let (tx, mut rx) = mpsc::channel(8);
        let (_stop, shutdown) = watch::channel(false);

        let handle = spawn_timer(daily(), Arc::new(clock.clone()), tx, shutdown);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.job, "daily");
        assert_eq!(first.frequency, Frequency::Daily);
        assert_eq!(
            first.fired_at,
            Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap()
        );

        clock.set(first.fired_at);
        let second = rx.recv().await.unwrap();
        assert_eq!(
            second.fired_at,
            Utc.with_ymd_and_hms(2024, 3, 12, 0, 0, 0).unwrap()
        );

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_stops_on_shutdown() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap());
        let (tx, mut rx) = mpsc::channel(8);
        let (stop, shutdown) = watch::channel(false);

        let handle = spawn_timer(daily(), Arc::new(clock), tx, shutdown);
        tokio::time::sleep(Duration::from_secs(60)).await;
        stop.send(true).unwrap();

        handle.await.unwrap();
        // The sender was dropped with the task, nothing was queued
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_queue_drops_fire() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 0).unwrap());
        let (tx, mut rx) = mpsc::channel(1);
        let (_stop, shutdown) = watch::channel(false);

        let handle = spawn_timer(daily(), Arc::new(clock), tx, shutdown);
        // Nobody reads for three days: only the first fire fits in the queue
        tokio::time::sleep(Duration::from_secs(3 * 24 * 3600)).await;
        handle.abort();

        let queued = rx.recv().await.unwrap();
        assert_eq!(
            queued.fired_at,
            Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap()
        );
        assert!(rx.recv().await.is_none());
    }
}
