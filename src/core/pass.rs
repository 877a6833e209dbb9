//! Recurrence pass - Books every due recurrence of one frequency.
//!
//! A pass walks incomes, expenses and savings in that order. Each recurrence is
//! resolved into movements and each movement is materialized on its own, so a
//! failing recurrence is logged and counted without stopping the rest of the
//! pass. Running the same pass twice books everything twice; see
//! [`crate::core::run_ledger`] for the once-per-period guard.

use crate::{
    clock::Clock,
    core::{allocation, materialize, recurrence},
    entities::{Frequency, ItemKind, TransactionModel},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{info, warn};

const PASS_ORDER: [ItemKind; 3] = [ItemKind::Income, ItemKind::Expense, ItemKind::Saving];

/// One recurrence that could not be booked.
#[derive(Debug, Clone, Serialize)]
pub struct PassFailure {
    /// Recurrence that failed
    pub recurrence_id: i64,
    /// Rendered [`Error::Materialization`]
    pub message: String,
}

/// Outcome of one pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    /// Frequency the pass processed
    pub frequency: Frequency,
    /// Date the pass ran for
    pub date: NaiveDate,
    /// Recurrences that were due
    pub recurrences_processed: usize,
    /// Transactions written
    pub transactions_created: usize,
    /// Recurrences that failed, possibly after booking some of their movements
    pub failures: Vec<PassFailure>,
}

async fn book_recurrence(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    due: &recurrence::ResolvedRecurrence,
    created: &mut Vec<TransactionModel>,
) -> Result<()> {
    let movements = allocation::resolve_movements(db, &due.recurrence, &due.item).await?;
    for movement in &movements {
        created.push(materialize::materialize(db, clock, movement).await?);
    }
    Ok(())
}

/// Books every active recurrence due for `frequency` on `date`.
///
/// # Errors
/// Only fails if the due recurrences cannot be loaded. Per-recurrence failures
/// end up in [`PassReport::failures`].
pub async fn run_pass(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    frequency: Frequency,
    date: NaiveDate,
) -> Result<PassReport> {
    let mut report = PassReport {
        frequency,
        date,
        recurrences_processed: 0,
        transactions_created: 0,
        failures: Vec::new(),
    };

    for kind in PASS_ORDER {
        let due = recurrence::find_due(db, kind, frequency, date).await?;
        for entry in &due {
            report.recurrences_processed += 1;
            let mut created = Vec::new();
            let outcome = book_recurrence(db, clock, entry, &mut created).await;
            report.transactions_created += created.len();

            if let Err(source) = outcome {
                let err = Error::Materialization {
                    recurrence_id: entry.recurrence.id,
                    message: source.to_string(),
                };
                warn!(
                    recurrence_id = entry.recurrence.id,
                    %frequency,
                    booked = created.len(),
                    error = %err,
                    "Recurrence failed during pass"
                );
                report.failures.push(PassFailure {
                    recurrence_id: entry.recurrence.id,
                    message: err.to_string(),
                });
            }
        }
    }

    info!(
        %frequency,
        %date,
        processed = report.recurrences_processed,
        created = report.transactions_created,
        failed = report.failures.len(),
        "Pass finished"
    );
    Ok(report)
}

/// Renders a pass report as a short multi-line summary for logs.
#[must_use]
pub fn format_pass_summary(report: &PassReport) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "{} pass - {} - {} recurrences, {} transactions\n",
        report.frequency, report.date, report.recurrences_processed, report.transactions_created
    );
    for failure in &report.failures {
        // Writing to a String cannot fail
        let _ = writeln!(summary, "  recurrence {}: {}", failure.recurrence_id, failure.message);
    }
    summary
}
