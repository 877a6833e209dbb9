//! Transaction business logic - Manual entries, listing and soft deletes.
//!
//! Scheduled passes book transactions through [`crate::core::materialize`]; this
//! module covers the interactive side. Booking an item by hand ignores its
//! allocations and moves the full amount on the chosen account. Deleting a
//! transaction keeps the row and reverses its effect on the account balance.

use crate::{
    clock::Clock,
    core::{
        account, item,
        materialize::{self, Movement},
    },
    entities::{ItemRef, Source, Transaction, TransactionType, transaction},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

const fn direct_source(item: ItemRef) -> Source {
    match item {
        ItemRef::Income(id) => Source::Income(id),
        ItemRef::Expense(id) => Source::Expense(id),
        ItemRef::Saving(id) => Source::Saving(id),
    }
}

/// Books one occurrence of `item` on `account_id` right now.
///
/// The description defaults to the item's name.
///
/// # Errors
/// Returns [`Error::NotFound`] if the item or account does not belong to `owner_id`.
pub async fn record_entry(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    account_id: i64,
    item: ItemRef,
    description: Option<String>,
) -> Result<transaction::Model> {
    let loaded = item::get_item_for_owner(db, owner_id, item).await?;

    let movement = Movement {
        owner_id,
        account_id,
        transaction_type: TransactionType::from(item.kind()),
        magnitude: loaded.amount(),
        source: Some(direct_source(item)),
        description: description.unwrap_or_else(|| loaded.name().to_string()),
    };
    let model = materialize::materialize(db, clock, &movement).await?;

    info!(
        transaction_id = model.id,
        account_id,
        kind = %item.kind(),
        item_id = item.id(),
        "Recorded manual entry"
    );
    Ok(model)
}

/// Loads an active transaction belonging to `owner_id`.
pub async fn get_transaction_for_owner<C>(
    db: &C,
    owner_id: i64,
    transaction_id: i64,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .filter(|t| t.owner_id == owner_id && !t.is_deleted)
        .ok_or_else(|| Error::not_found("transaction", transaction_id))
}

/// Active transactions on an account, newest first.
pub async fn list_transactions_for_account(
    db: &DatabaseConnection,
    owner_id: i64,
    account_id: i64,
) -> Result<Vec<transaction::Model>> {
    account::get_account_for_owner(db, owner_id, account_id).await?;
    Transaction::find()
        .filter(transaction::Column::AccountId.eq(account_id))
        .filter(transaction::Column::IsDeleted.eq(false))
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active transactions of an owner across all accounts, newest first.
pub async fn list_transactions_for_owner(
    db: &DatabaseConnection,
    owner_id: i64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::OwnerId.eq(owner_id))
        .filter(transaction::Column::IsDeleted.eq(false))
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Soft-deletes a transaction and reverses its amount on the account balance.
pub async fn soft_delete_transaction(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    transaction_id: i64,
) -> Result<transaction::Model> {
    let txn = db.begin().await?;

    let existing = get_transaction_for_owner(&txn, owner_id, transaction_id).await?;
    let account_id = existing.account_id;
    let amount_to_reverse = -existing.amount;

    let mut active: transaction::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.deleted_at = Set(Some(clock.now()));
    let deleted = active.update(&txn).await?;

    account::adjust_balance(&txn, account_id, amount_to_reverse).await?;
    txn.commit().await?;

    info!(transaction_id, account_id, "Soft-deleted transaction");
    Ok(deleted)
}
