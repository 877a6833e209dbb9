//! Recurrence store - Standing links between an owner, an account and one
//! recurring income, expense or saving.
//!
//! Queries only return recurrences that are themselves active, whose item is
//! active and whose account is active.

use crate::{
    clock::Clock,
    core::{
        account,
        item::{self, RecurringItem},
    },
    entities::{
        Account, AccountColumn, Frequency, ItemKind, ItemRef, Recurrence, RecurrenceColumn,
        recurrence,
    },
    errors::{Error, Result},
    scheduler::rule::falls_on,
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// A recurrence together with the item it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRecurrence {
    /// The recurrence row
    pub recurrence: recurrence::Model,
    /// The income, expense or saving
    pub item: RecurringItem,
}

/// Sets up a recurrence of `item` on `account_id`.
///
/// # Errors
/// Returns [`Error::NotFound`] if the account or item is missing, deleted, or
/// owned by someone other than `owner_id`.
pub async fn create_recurrence(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    account_id: i64,
    item: ItemRef,
) -> Result<recurrence::Model> {
    account::get_account_for_owner(db, owner_id, account_id).await?;
    item::get_item_for_owner(db, owner_id, item).await?;

    let model = recurrence::ActiveModel {
        owner_id: Set(owner_id),
        account_id: Set(account_id),
        kind: Set(item.kind()),
        item_id: Set(item.id()),
        created_at: Set(clock.now()),
        is_deleted: Set(false),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(recurrence_id = model.id, kind = %item.kind(), item_id = item.id(), "Created recurrence");
    Ok(model)
}

/// Soft-deletes a recurrence. Transactions it already produced are kept.
///
/// # Errors
/// Returns [`Error::NotFound`] if the recurrence is missing, already deleted, or
/// owned by someone other than `owner_id`.
pub async fn soft_delete_recurrence(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    recurrence_id: i64,
) -> Result<recurrence::Model> {
    let existing = Recurrence::find_by_id(recurrence_id)
        .one(db)
        .await?
        .filter(|r| r.owner_id == owner_id && !r.is_deleted)
        .ok_or_else(|| Error::not_found("recurrence", recurrence_id))?;

    let mut active: recurrence::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.deleted_at = Set(Some(clock.now()));
    active.update(db).await.map_err(Into::into)
}

/// Active recurrences owned by `owner_id`, oldest first.
pub async fn find_by_owner<C>(db: &C, owner_id: i64) -> Result<Vec<recurrence::Model>>
where
    C: ConnectionTrait,
{
    Recurrence::find()
        .filter(RecurrenceColumn::OwnerId.eq(owner_id))
        .filter(RecurrenceColumn::IsDeleted.eq(false))
        .order_by_asc(RecurrenceColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active recurrences booked on `account_id`, oldest first.
pub async fn find_by_account<C>(db: &C, account_id: i64) -> Result<Vec<recurrence::Model>>
where
    C: ConnectionTrait,
{
    Recurrence::find()
        .filter(RecurrenceColumn::AccountId.eq(account_id))
        .filter(RecurrenceColumn::IsDeleted.eq(false))
        .order_by_asc(RecurrenceColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Pairs each recurrence with its item, dropping those whose item is gone or deleted.
pub async fn resolve_items<C>(
    db: &C,
    recurrences: Vec<recurrence::Model>,
) -> Result<Vec<ResolvedRecurrence>>
where
    C: ConnectionTrait,
{
    let mut ids_by_kind: HashMap<ItemKind, Vec<i64>> = HashMap::new();
    for r in &recurrences {
        ids_by_kind.entry(r.kind).or_default().push(r.item_id);
    }

    let mut items: HashMap<ItemRef, RecurringItem> = HashMap::new();
    for (kind, ids) in ids_by_kind {
        for (id, loaded) in item::load_items(db, kind, ids).await? {
            items.insert(ItemRef::new(kind, id), loaded);
        }
    }

    Ok(recurrences
        .into_iter()
        .filter_map(|recurrence| {
            let item = items.get(&recurrence.item())?.clone();
            (!item.is_deleted()).then_some(ResolvedRecurrence { recurrence, item })
        })
        .collect())
}

async fn active_account_ids<C>(db: &C, account_ids: Vec<i64>) -> Result<HashSet<i64>>
where
    C: ConnectionTrait,
{
    if account_ids.is_empty() {
        return Ok(HashSet::new());
    }
    Ok(Account::find()
        .filter(AccountColumn::Id.is_in(account_ids))
        .filter(AccountColumn::IsDeleted.eq(false))
        .all(db)
        .await?
        .into_iter()
        .map(|a| a.id)
        .collect())
}

/// Active recurrences of `kind` whose items match `items`, on active accounts.
async fn recurrences_for_items<C>(
    db: &C,
    kind: ItemKind,
    items: Vec<RecurringItem>,
) -> Result<Vec<ResolvedRecurrence>>
where
    C: ConnectionTrait,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let items: HashMap<i64, RecurringItem> = items.into_iter().map(|i| (i.id(), i)).collect();

    let recurrences = Recurrence::find()
        .filter(RecurrenceColumn::Kind.eq(kind))
        .filter(RecurrenceColumn::ItemId.is_in(items.keys().copied().collect::<Vec<_>>()))
        .filter(RecurrenceColumn::IsDeleted.eq(false))
        .order_by_asc(RecurrenceColumn::Id)
        .all(db)
        .await?;

    let live_accounts =
        active_account_ids(db, recurrences.iter().map(|r| r.account_id).collect()).await?;

    Ok(recurrences
        .into_iter()
        .filter(|r| live_accounts.contains(&r.account_id))
        .filter_map(|recurrence| {
            let item = items.get(&recurrence.item_id)?.clone();
            Some(ResolvedRecurrence { recurrence, item })
        })
        .collect())
}

/// Active recurrences of `kind` whose item has exactly `frequency`.
pub async fn find_by_frequency<C>(
    db: &C,
    kind: ItemKind,
    frequency: Frequency,
) -> Result<Vec<ResolvedRecurrence>>
where
    C: ConnectionTrait,
{
    let items = item::find_items_by_frequency(db, kind, &[frequency]).await?;
    recurrences_for_items(db, kind, items).await
}

/// Recurrences a pass for `frequency` on `today` should book.
///
/// Matches [`find_by_frequency`], except that the daily pass also picks up
/// [`Frequency::Other`] items whose `scheduled_day` lands on `today`.
pub async fn find_due<C>(
    db: &C,
    kind: ItemKind,
    frequency: Frequency,
    today: NaiveDate,
) -> Result<Vec<ResolvedRecurrence>>
where
    C: ConnectionTrait,
{
    if frequency != Frequency::Daily {
        return find_by_frequency(db, kind, frequency).await;
    }

    let items = item::find_items_by_frequency(db, kind, &[Frequency::Daily, Frequency::Other])
        .await?
        .into_iter()
        .filter(|i| is_due(i, today))
        .collect();
    recurrences_for_items(db, kind, items).await
}

fn is_due(item: &RecurringItem, today: NaiveDate) -> bool {
    match item.frequency() {
        Frequency::Other => item
            .scheduled_day()
            .and_then(|day| u32::try_from(day).ok())
            .is_some_and(|day| falls_on(today, day)),
        _ => true,
    }
}
