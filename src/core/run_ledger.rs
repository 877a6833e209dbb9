//! Run ledger - Remembers which scheduled passes already ran.
//!
//! Each pass covers one calendar period of its frequency, identified by a
//! period key. A pass claims its (`frequency`, `period_key`) row before doing any
//! work; the unique index on that pair makes a second claim fail, so a restart
//! or a duplicate timer tick inside the same period is skipped.

use crate::{
    entities::{Frequency, JobRun, JobRunColumn, job_run},
    errors::Result,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::{Set, prelude::*};
use tracing::debug;

/// Key of the calendar period `date` falls in for `frequency`.
///
/// * daily, biweekly and other: `YYYY-MM-DD`
/// * weekly: ISO week, `YYYY-Www`
/// * monthly: `YYYY-MM`
/// * annual: `YYYY`
#[must_use]
pub fn period_key(frequency: Frequency, date: NaiveDate) -> String {
    match frequency {
        Frequency::Daily | Frequency::Biweekly | Frequency::Other => {
            date.format("%Y-%m-%d").to_string()
        }
        Frequency::Weekly => {
            let week = date.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        Frequency::Monthly => date.format("%Y-%m").to_string(),
        Frequency::Annual => date.format("%Y").to_string(),
    }
}

/// Looks up the ledger row for one period.
pub async fn get_run<C>(db: &C, frequency: Frequency, period_key: &str) -> Result<Option<job_run::Model>>
where
    C: ConnectionTrait,
{
    JobRun::find()
        .filter(JobRunColumn::Frequency.eq(frequency))
        .filter(JobRunColumn::PeriodKey.eq(period_key))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Claims the period `date` falls in for `frequency`.
///
/// Returns `None` if the period was already claimed.
pub async fn claim_run<C>(
    db: &C,
    frequency: Frequency,
    date: NaiveDate,
    started_at: DateTime<Utc>,
) -> Result<Option<job_run::Model>>
where
    C: ConnectionTrait,
{
    let key = period_key(frequency, date);
    if get_run(db, frequency, &key).await?.is_some() {
        debug!(%frequency, period_key = %key, "Period already claimed");
        return Ok(None);
    }

    let claim = job_run::ActiveModel {
        frequency: Set(frequency),
        period_key: Set(key.clone()),
        started_at: Set(started_at),
        finished_at: Set(None),
        transactions_created: Set(None),
        failures: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await;

    match claim {
        Ok(model) => Ok(Some(model)),
        // Lost the race against another claim of the same period
        Err(err) if get_run(db, frequency, &key).await?.is_some() => {
            debug!(%frequency, period_key = %key, error = %err, "Period claimed concurrently");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Stores the outcome of a claimed pass.
pub async fn complete_run<C>(
    db: &C,
    run: job_run::Model,
    finished_at: DateTime<Utc>,
    transactions_created: usize,
    failures: usize,
) -> Result<job_run::Model>
where
    C: ConnectionTrait,
{
    let mut active: job_run::ActiveModel = run.into();
    active.finished_at = Set(Some(finished_at));
    active.transactions_created = Set(Some(i32::try_from(transactions_created).unwrap_or(i32::MAX)));
    active.failures = Set(Some(i32::try_from(failures).unwrap_or(i32::MAX)));
    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::clock::Clock;
    use crate::test_utils::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_keys() {
        let day = date(2024, 3, 10);
        assert_eq!(period_key(Frequency::Daily, day), "2024-03-10");
        assert_eq!(period_key(Frequency::Biweekly, day), "2024-03-10");
        assert_eq!(period_key(Frequency::Weekly, day), "2024-W10");
        assert_eq!(period_key(Frequency::Monthly, day), "2024-03");
        assert_eq!(period_key(Frequency::Annual, day), "2024");
        // ISO weeks can belong to the previous year
        assert_eq!(period_key(Frequency::Weekly, date(2021, 1, 1)), "2020-W53");
    }

    #[tokio::test]
    async fn test_claim_is_once_per_period() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 1);

        let first = claim_run(&db, Frequency::Monthly, date(2024, 3, 1), clock.now()).await?;
        assert!(first.is_some());

        let same_month = claim_run(&db, Frequency::Monthly, date(2024, 3, 20), clock.now()).await?;
        assert!(same_month.is_none());

        // Different frequency, same day
        let daily = claim_run(&db, Frequency::Daily, date(2024, 3, 1), clock.now()).await?;
        assert!(daily.is_some());

        let next_month = claim_run(&db, Frequency::Monthly, date(2024, 4, 1), clock.now()).await?;
        assert!(next_month.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_complete_run_records_counts() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 1, 1);

        let run = claim_run(&db, Frequency::Annual, clock.today(), clock.now())
            .await?
            .unwrap();
        assert!(run.finished_at.is_none());

        complete_run(&db, run, clock.now(), 12, 1).await?;

        let stored = get_run(&db, Frequency::Annual, "2024").await?.unwrap();
        assert_eq!(stored.finished_at, Some(clock.now()));
        assert_eq!(stored.transactions_created, Some(12));
        assert_eq!(stored.failures, Some(1));

        Ok(())
    }
}
