//! Shared test utilities.
//!
//! This module provides helpers for setting up test databases and creating
//! test entities with sensible defaults.

use crate::{
    clock::{Clock, FixedClock},
    core::{account, item, recurrence},
    entities::{self, AccountType, Frequency, ItemRef},
    errors::Result,
};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A clock frozen at noon UTC on the given date.
///
/// # Panics
/// Panics if the date is invalid.
#[allow(clippy::unwrap_used)]
pub fn clock_at(year: i32, month: u32, day: u32) -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap())
}

/// Clock used to stamp accounts and items built by the fixtures below.
fn fixture_clock() -> FixedClock {
    clock_at(2024, 1, 1)
}

/// Creates a personal, non-default account with a zero balance.
pub async fn create_test_account(
    db: &DatabaseConnection,
    owner_id: i64,
    name: &str,
) -> Result<entities::account::Model> {
    account::create_account(
        db,
        &fixture_clock(),
        owner_id,
        name.to_string(),
        AccountType::Personal,
        false,
    )
    .await
}

/// Creates an income named "Test income" with no tax.
pub async fn create_test_income(
    db: &DatabaseConnection,
    owner_id: i64,
    amount: Decimal,
    frequency: Frequency,
) -> Result<entities::income::Model> {
    let item = item::NewItem::new(owner_id, "Test income", amount, frequency);
    item::create_income(db, &fixture_clock(), item).await
}

/// Creates an uncategorized expense named "Test expense" with no tax.
pub async fn create_test_expense(
    db: &DatabaseConnection,
    owner_id: i64,
    amount: Decimal,
    frequency: Frequency,
) -> Result<entities::expense::Model> {
    let item = item::NewItem::new(owner_id, "Test expense", amount, frequency);
    item::create_expense(db, &fixture_clock(), item).await
}

/// Creates a saving named "Test saving" with no tax.
pub async fn create_test_saving(
    db: &DatabaseConnection,
    owner_id: i64,
    amount: Decimal,
    frequency: Frequency,
) -> Result<entities::saving::Model> {
    let item = item::NewItem::new(owner_id, "Test saving", amount, frequency);
    item::create_saving(db, &fixture_clock(), item).await
}

/// Links `item` to `account_id`, stamped with `clock`.
pub async fn create_test_recurrence(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    account_id: i64,
    item: ItemRef,
) -> Result<entities::recurrence::Model> {
    recurrence::create_recurrence(db, clock, owner_id, account_id, item).await
}
