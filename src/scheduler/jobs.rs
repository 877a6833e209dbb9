//! Job table and the requests timers put on the pass queue.

use super::rule::CalendarRule;
use crate::{
    config::{JobConfig, SchedulerConfig},
    entities::Frequency,
};
use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;

/// A job armed by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledJob {
    /// Name used in logs
    pub name: String,
    /// Frequency processed when the job fires
    pub frequency: Frequency,
    /// When the job fires
    pub rule: CalendarRule,
    /// Time of day (UTC) the job fires at
    pub at: NaiveTime,
}

impl ScheduledJob {
    /// First fire instant strictly after `after`.
    #[must_use]
    pub fn next_fire(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.rule.next_after(after, self.at)
    }
}

impl From<&JobConfig> for ScheduledJob {
    fn from(config: &JobConfig) -> Self {
        Self {
            name: config.name.clone(),
            frequency: config.frequency,
            rule: config.rule.clone(),
            at: config.at,
        }
    }
}

/// The enabled jobs of `config`, in table order.
#[must_use]
pub fn job_table(config: &SchedulerConfig) -> Vec<ScheduledJob> {
    config
        .jobs
        .iter()
        .filter(|job| job.enabled)
        .map(ScheduledJob::from)
        .collect()
}

/// A request to run the pass for one frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassRequest {
    /// Job that fired
    pub job: String,
    /// Frequency to process
    pub frequency: Frequency,
    /// Instant the job was due
    pub fired_at: DateTime<Utc>,
}
