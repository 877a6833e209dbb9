//! Scheduler - Fires recurrence passes on calendar rules.
//!
//! ```text
//! timer (one per job) --PassRequest--> bounded queue --> dispatcher --> worker task --> PassHandler
//! ```
//!
//! Timers never wait for a pass to finish. Shutting down stops the timers and
//! closes the queue; requests already queued still run before
//! [`Scheduler::shutdown`] returns.

pub mod dispatch;
pub mod handler;
pub mod jobs;
pub mod rule;
pub mod timer;

pub use dispatch::{PassHandler, PassOutcome};
pub use handler::RecurrencePassHandler;
pub use jobs::{PassRequest, ScheduledJob, job_table};
pub use rule::CalendarRule;

use crate::{
    clock::Clock,
    config::SchedulerConfig,
    errors::{Error, Result},
};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{info, warn};

/// A running scheduler.
pub struct Scheduler {
    queue: mpsc::Sender<PassRequest>,
    stop: watch::Sender<bool>,
    timers: Vec<JoinHandle<()>>,
    dispatcher: JoinHandle<()>,
}

impl Scheduler {
    /// Arms one timer per enabled job and starts the dispatcher.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if `config` does not validate.
    pub fn start(
        config: &SchedulerConfig,
        clock: Arc<dyn Clock>,
        handler: Arc<dyn PassHandler>,
    ) -> Result<Self> {
        config.validate()?;

        let (queue, receiver) = mpsc::channel(config.queue_capacity);
        let (stop, shutdown) = watch::channel(false);
        let dispatcher = dispatch::spawn_dispatcher(handler, receiver, config.worker_limit);

        let timers: Vec<_> = job_table(config)
            .into_iter()
            .map(|job| {
                info!(job = %job.name, frequency = %job.frequency, "Arming job");
                timer::spawn_timer(job, Arc::clone(&clock), queue.clone(), shutdown.clone())
            })
            .collect();

        info!(
            jobs = timers.len(),
            worker_limit = config.worker_limit,
            "Scheduler started"
        );
        Ok(Self {
            queue,
            stop,
            timers,
            dispatcher,
        })
    }

    /// Queues a pass outside the calendar, e.g. to catch up after downtime.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the queue is full or already closed.
    pub fn enqueue(&self, request: PassRequest) -> Result<()> {
        self.queue.try_send(request).map_err(|e| Error::Config {
            message: format!("Cannot queue pass: {e}"),
        })
    }

    /// Stops the timers and waits for queued and running passes to finish.
    pub async fn shutdown(self) {
        let Self {
            queue,
            stop,
            timers,
            dispatcher,
        } = self;

        if stop.send(true).is_err() {
            warn!("All timers had already stopped");
        }
        for timer in timers {
            if let Err(e) = timer.await {
                warn!(error = %e, "Timer task ended abnormally");
            }
        }
        drop(queue);
        if let Err(e) = dispatcher.await {
            warn!(error = %e, "Dispatcher ended abnormally");
        }
        info!("Scheduler stopped");
    }
}
