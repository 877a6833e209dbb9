//! Pass handler that books recurrences.

use super::{
    dispatch::{PassHandler, PassOutcome},
    jobs::PassRequest,
};
use crate::{
    clock::Clock,
    core::{pass, run_ledger},
    errors::Result,
};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{info, instrument};

/// Runs [`pass::run_pass`] for each request, dated on the day the job fired.
///
/// With `skip_completed_periods` set, the period is claimed in the run ledger
/// first and a request for an already claimed period is skipped. A pass that
/// crashes after claiming is not re-run for that period.
pub struct RecurrencePassHandler {
    db: Arc<DatabaseConnection>,
    clock: Arc<dyn Clock>,
    skip_completed_periods: bool,
}

impl RecurrencePassHandler {
    /// Creates a handler booking into `db`.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        clock: Arc<dyn Clock>,
        skip_completed_periods: bool,
    ) -> Self {
        Self {
            db,
            clock,
            skip_completed_periods,
        }
    }
}

#[async_trait]
impl PassHandler for RecurrencePassHandler {
    #[instrument(skip_all, fields(job = %request.job, frequency = %request.frequency))]
    async fn handle(&self, request: PassRequest) -> Result<PassOutcome> {
        let db = self.db.as_ref();
        let date = request.fired_at.date_naive();

        let claim = if self.skip_completed_periods {
            match run_ledger::claim_run(db, request.frequency, date, self.clock.now()).await? {
                Some(run) => Some(run),
                None => {
                    return Ok(PassOutcome::Skipped {
                        period_key: run_ledger::period_key(request.frequency, date),
                    });
                }
            }
        } else {
            None
        };

        let report = pass::run_pass(db, self.clock.as_ref(), request.frequency, date).await?;

        if let Some(run) = claim {
            run_ledger::complete_run(
                db,
                run,
                self.clock.now(),
                report.transactions_created,
                report.failures.len(),
            )
            .await?;
        }
        info!("{}", pass::format_pass_summary(&report).trim_end());
        Ok(PassOutcome::Completed(report))
    }
}
