//! Transaction materializer - Turns a resolved movement into a ledger transaction.
//!
//! Each call inserts exactly one transaction and moves the account balance by the
//! same signed amount, both inside one database transaction. The transaction row
//! records the balance it was booked against in `previous_balance`.

use crate::{
    clock::Clock,
    core::account,
    entities::{Source, TransactionType, transaction},
    errors::{Error, Result},
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::debug;

/// A single monetary movement waiting to be booked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movement {
    /// Owner of the resulting transaction
    pub owner_id: i64,
    /// Account the movement is booked on
    pub account_id: i64,
    /// Income, expense or saving
    pub transaction_type: TransactionType,
    /// Unsigned size of the movement
    pub magnitude: Decimal,
    /// What the movement was derived from
    pub source: Option<Source>,
    /// Description stored on the transaction
    pub description: String,
}

impl Movement {
    /// Amount as booked: income is positive, expenses and savings are negative.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        signed(self.transaction_type, self.magnitude)
    }
}

/// Applies the ledger sign convention to an unsigned amount.
#[must_use]
pub fn signed(transaction_type: TransactionType, magnitude: Decimal) -> Decimal {
    match transaction_type {
        TransactionType::Income => magnitude.abs(),
        TransactionType::Expense | TransactionType::Saving => -magnitude.abs(),
    }
}

/// Books `movement` as a transaction dated `clock.now()`.
///
/// # Errors
/// Returns [`Error::Validation`] for a negative magnitude, [`Error::NotFound`] if the account is missing, deleted or owned by
/// someone else, and [`Error::Database`] if the insert or balance update fails.
/// Nothing is written in either case.
pub async fn materialize(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    movement: &Movement,
) -> Result<transaction::Model> {
    check_movement(movement)?;
    let amount = movement.signed_amount();
    let txn = db.begin().await?;

    let account = account::get_account_for_owner(&txn, movement.owner_id, movement.account_id)
        .await?;

    let (source_kind, source_id) = movement
        .source
        .map(Source::into_parts)
        .map_or((None, None), |(kind, id)| (Some(kind), Some(id)));

    let model = transaction::ActiveModel {
        owner_id: Set(movement.owner_id),
        account_id: Set(account.id),
        transaction_type: Set(movement.transaction_type),
        amount: Set(amount),
        previous_balance: Set(account.balance),
        source_kind: Set(source_kind),
        source_id: Set(source_id),
        description: Set(movement.description.clone()),
        created_at: Set(clock.now()),
        is_deleted: Set(false),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    account::adjust_balance(&txn, account.id, amount).await?;
    txn.commit().await?;

    debug!(
        transaction_id = model.id,
        account_id = account.id,
        %amount,
        "Materialized transaction"
    );
    Ok(model)
}

/// Rejects movements that could not have come from a valid item.
fn check_movement(movement: &Movement) -> Result<()> {
    if movement.magnitude < Decimal::ZERO {
        return Err(Error::validation(
            "amount",
            format!("Movement amount cannot be negative: {}", movement.magnitude),
        ));
    }
    Ok(())
}
