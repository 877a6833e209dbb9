//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs.
//! The one index that cannot be expressed on an entity (the composite unique key
//! on `job_runs`) is created by hand.

use crate::entities::{
    Account, Category, Expense, Goal, Income, IncomeAllocation, JobRun, JobRunColumn, Recurrence,
    Saving, SavingAllocation, Tax, Transaction,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

/// Default database location when `DATABASE_URL` is unset.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/fintrack.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_file_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }
    debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Directory holding the file of a `sqlite://` URL, if it has one.
fn sqlite_file_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?.split('?').next()?;
    Path::new(path).parent().filter(|dir| !dir.as_os_str().is_empty())
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables (if missing) using `SeaORM`'s schema generation from entity definitions.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, Account).await?;
    create_table(db, &schema, Category).await?;
    create_table(db, &schema, Tax).await?;
    create_table(db, &schema, Income).await?;
    create_table(db, &schema, Expense).await?;
    create_table(db, &schema, Saving).await?;
    create_table(db, &schema, IncomeAllocation).await?;
    create_table(db, &schema, SavingAllocation).await?;
    create_table(db, &schema, Recurrence).await?;
    create_table(db, &schema, Transaction).await?;
    create_table(db, &schema, Goal).await?;
    create_table(db, &schema, JobRun).await?;

    let run_period_index = Index::create()
        .if_not_exists()
        .name("idx_job_runs_frequency_period")
        .table(JobRun)
        .col(JobRunColumn::Frequency)
        .col(JobRunColumn::PeriodKey)
        .unique()
        .to_owned();
    db.execute(builder.build(&run_period_index)).await?;

    info!("Database tables ensured");
    Ok(())
}
