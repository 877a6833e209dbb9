//! Allocation resolvers - Split an income or saving across accounts.
//!
//! Income allocations carry a `percentage` of the income amount; the active
//! percentages of one income may not add up to more than 1. Saving allocations
//! carry a fixed `amount` that is moved as-is on every occurrence. Expenses are
//! never split: they book their full amount on the recurrence's account.

use crate::{
    clock::Clock,
    core::{
        account,
        item::{self, RecurringItem},
        materialize::Movement,
    },
    entities::{
        Account, IncomeAllocation, ItemRef, RecurrenceModel, SavingAllocation, Source,
        TransactionType, expense, income, income_allocation, saving, saving_allocation,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashSet;
use tracing::{debug, info};

/// Adds an allocation sending `percentage` of an income to an account.
///
/// # Errors
/// Returns [`Error::Validation`] if `percentage` is outside `[0, 1]` or would push
/// the income's active allocations above 1, and [`Error::NotFound`] if the income
/// or account does not belong to `owner_id`.
pub async fn add_income_allocation(
    db: &DatabaseConnection,
    owner_id: i64,
    income_id: i64,
    account_id: i64,
    percentage: Decimal,
) -> Result<income_allocation::Model> {
    if percentage < Decimal::ZERO || percentage > Decimal::ONE {
        return Err(Error::validation(
            "percentage",
            format!("{percentage} is outside [0, 1]"),
        ));
    }

    let txn = db.begin().await?;
    item::get_item_for_owner(&txn, owner_id, ItemRef::Income(income_id)).await?;
    account::get_account_for_owner(&txn, owner_id, account_id).await?;

    let allocated: Decimal = active_income_allocations(&txn, income_id)
        .await?
        .iter()
        .map(|a| a.percentage)
        .sum();
    if allocated + percentage > Decimal::ONE {
        return Err(Error::validation(
            "percentage",
            format!("Income {income_id} is already {allocated} allocated; adding {percentage} exceeds 1"),
        ));
    }

    let model = income_allocation::ActiveModel {
        income_id: Set(income_id),
        account_id: Set(account_id),
        percentage: Set(percentage),
        is_deleted: Set(false),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(allocation_id = model.id, income_id, account_id, %percentage, "Added income allocation");
    Ok(model)
}

/// Adds an allocation setting aside a fixed `amount` of a saving in an account.
pub async fn add_saving_allocation(
    db: &DatabaseConnection,
    owner_id: i64,
    saving_id: i64,
    account_id: i64,
    amount: Decimal,
) -> Result<saving_allocation::Model> {
    if amount < Decimal::ZERO {
        return Err(Error::validation(
            "amount",
            format!("Allocation amount cannot be negative: {amount}"),
        ));
    }

    item::get_item_for_owner(db, owner_id, ItemRef::Saving(saving_id)).await?;
    account::get_account_for_owner(db, owner_id, account_id).await?;

    let model = saving_allocation::ActiveModel {
        saving_id: Set(saving_id),
        account_id: Set(account_id),
        amount: Set(amount),
        is_deleted: Set(false),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(allocation_id = model.id, saving_id, account_id, %amount, "Added saving allocation");
    Ok(model)
}

/// Active allocations of an income.
pub async fn active_income_allocations<C>(
    db: &C,
    income_id: i64,
) -> Result<Vec<income_allocation::Model>>
where
    C: ConnectionTrait,
{
    IncomeAllocation::find()
        .filter(income_allocation::Column::IncomeId.eq(income_id))
        .filter(income_allocation::Column::IsDeleted.eq(false))
        .order_by_asc(income_allocation::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active allocations of a saving.
pub async fn active_saving_allocations<C>(
    db: &C,
    saving_id: i64,
) -> Result<Vec<saving_allocation::Model>>
where
    C: ConnectionTrait,
{
    SavingAllocation::find()
        .filter(saving_allocation::Column::SavingId.eq(saving_id))
        .filter(saving_allocation::Column::IsDeleted.eq(false))
        .order_by_asc(saving_allocation::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active allocations of an income owned by `owner_id`.
pub async fn list_income_allocations(
    db: &DatabaseConnection,
    owner_id: i64,
    income_id: i64,
) -> Result<Vec<income_allocation::Model>> {
    item::get_item_for_owner(db, owner_id, ItemRef::Income(income_id)).await?;
    active_income_allocations(db, income_id).await
}

/// Active allocations of a saving owned by `owner_id`.
pub async fn list_saving_allocations(
    db: &DatabaseConnection,
    owner_id: i64,
    saving_id: i64,
) -> Result<Vec<saving_allocation::Model>> {
    item::get_item_for_owner(db, owner_id, ItemRef::Saving(saving_id)).await?;
    active_saving_allocations(db, saving_id).await
}

/// Soft-deletes an income allocation, checking the income belongs to `owner_id`.
///
/// # Errors
/// Returns [`Error::NotFound`] if the allocation is missing, already deleted, or
/// its income belongs to someone other than `owner_id`.
pub async fn soft_delete_income_allocation(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    allocation_id: i64,
) -> Result<income_allocation::Model> {
    let allocation = IncomeAllocation::find_by_id(allocation_id)
        .one(db)
        .await?
        .filter(|a| !a.is_deleted)
        .ok_or_else(|| Error::not_found("income allocation", allocation_id))?;
    item::get_item_for_owner(db, owner_id, ItemRef::Income(allocation.income_id))
        .await
        .map_err(|_| Error::not_found("income allocation", allocation_id))?;

    let mut active: income_allocation::ActiveModel = allocation.into();
    active.is_deleted = Set(true);
    active.deleted_at = Set(Some(clock.now()));
    active.update(db).await.map_err(Into::into)
}

/// Soft-deletes a saving allocation, checking the saving belongs to `owner_id`.
///
/// # Errors
/// Returns [`Error::NotFound`] if the allocation is missing, already deleted, or
/// its saving belongs to someone other than `owner_id`.
pub async fn soft_delete_saving_allocation(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    allocation_id: i64,
) -> Result<saving_allocation::Model> {
    let allocation = SavingAllocation::find_by_id(allocation_id)
        .one(db)
        .await?
        .filter(|a| !a.is_deleted)
        .ok_or_else(|| Error::not_found("saving allocation", allocation_id))?;
    item::get_item_for_owner(db, owner_id, ItemRef::Saving(allocation.saving_id))
        .await
        .map_err(|_| Error::not_found("saving allocation", allocation_id))?;

    let mut active: saving_allocation::ActiveModel = allocation.into();
    active.is_deleted = Set(true);
    active.deleted_at = Set(Some(clock.now()));
    active.update(db).await.map_err(Into::into)
}

/// One movement per income allocation: `percentage * income.amount`.
#[must_use]
pub fn income_movements(
    income: &income::Model,
    allocations: &[income_allocation::Model],
) -> Vec<Movement> {
    allocations
        .iter()
        .map(|allocation| Movement {
            owner_id: income.owner_id,
            account_id: allocation.account_id,
            transaction_type: TransactionType::Income,
            magnitude: allocation.percentage * income.amount,
            source: Some(Source::IncomeAllocation(allocation.id)),
            description: income.name.clone(),
        })
        .collect()
}

/// One movement per saving allocation, moving the allocation's fixed amount.
#[must_use]
pub fn saving_movements(
    saving: &saving::Model,
    allocations: &[saving_allocation::Model],
) -> Vec<Movement> {
    allocations
        .iter()
        .map(|allocation| Movement {
            owner_id: saving.owner_id,
            account_id: allocation.account_id,
            transaction_type: TransactionType::Saving,
            magnitude: allocation.amount,
            source: Some(Source::SavingAllocation(allocation.id)),
            description: saving.name.clone(),
        })
        .collect()
}

/// The single movement of an expense recurrence.
#[must_use]
pub fn expense_movement(recurrence: &RecurrenceModel, expense: &expense::Model) -> Movement {
    Movement {
        owner_id: recurrence.owner_id,
        account_id: recurrence.account_id,
        transaction_type: TransactionType::Expense,
        magnitude: expense.amount,
        source: Some(Source::Expense(expense.id)),
        description: expense.name.clone(),
    }
}

async fn deleted_accounts<C>(db: &C, account_ids: Vec<i64>) -> Result<HashSet<i64>>
where
    C: ConnectionTrait,
{
    if account_ids.is_empty() {
        return Ok(HashSet::new());
    }
    Ok(Account::find()
        .filter(crate::entities::AccountColumn::Id.is_in(account_ids))
        .all(db)
        .await?
        .into_iter()
        .filter(|a| a.is_deleted)
        .map(|a| a.id)
        .collect())
}

/// Expands a recurrence into the movements it books. Allocations pointing at a
/// deleted account are skipped.
pub async fn resolve_movements<C>(
    db: &C,
    recurrence: &RecurrenceModel,
    item: &RecurringItem,
) -> Result<Vec<Movement>>
where
    C: ConnectionTrait,
{
    let movements = match item {
        RecurringItem::Expense(expense) => return Ok(vec![expense_movement(recurrence, expense)]),
        RecurringItem::Income(income) => {
            let allocations = active_income_allocations(db, income.id).await?;
            income_movements(income, &allocations)
        }
        RecurringItem::Saving(saving) => {
            let allocations = active_saving_allocations(db, saving.id).await?;
            saving_movements(saving, &allocations)
        }
    };

    let deleted = deleted_accounts(db, movements.iter().map(|m| m.account_id).collect()).await?;
    Ok(movements
        .into_iter()
        .filter(|m| {
            let keep = !deleted.contains(&m.account_id);
            if !keep {
                debug!(
                    recurrence_id = recurrence.id,
                    account_id = m.account_id,
                    "Skipping allocation to deleted account"
                );
            }
            keep
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::Frequency;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_income_movements_use_percentage_of_amount() -> Result<()> {
        let db = setup_test_db().await?;
        let checking = create_test_account(&db, 1, "Checking").await?;
        let savings = create_test_account(&db, 1, "Savings").await?;
        let salary = create_test_income(&db, 1, dec!(3000), Frequency::Monthly).await?;

        add_income_allocation(&db, 1, salary.id, checking.id, dec!(0.75)).await?;
        add_income_allocation(&db, 1, salary.id, savings.id, dec!(0.25)).await?;

        let allocations = active_income_allocations(&db, salary.id).await?;
        let movements = income_movements(&salary, &allocations);
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[0].magnitude, dec!(2250));
        assert_eq!(movements[0].account_id, checking.id);
        assert_eq!(movements[1].magnitude, dec!(750));
        assert!(movements.iter().all(|m| m.transaction_type == TransactionType::Income));

        Ok(())
    }

    #[tokio::test]
    async fn test_income_allocation_sum_capped_at_one() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 10);
        let checking = create_test_account(&db, 1, "Checking").await?;
        let salary = create_test_income(&db, 1, dec!(1000), Frequency::Monthly).await?;

        add_income_allocation(&db, 1, salary.id, checking.id, dec!(0.75)).await?;
        let over = add_income_allocation(&db, 1, salary.id, checking.id, dec!(0.5)).await;
        assert!(matches!(
            over.unwrap_err(),
            Error::Validation { field, .. } if field == "percentage"
        ));

        // Deleting frees up the share again
        let first = list_income_allocations(&db, 1, salary.id).await?.remove(0);
        assert!(soft_delete_income_allocation(&db, &clock, 2, first.id).await.is_err());
        soft_delete_income_allocation(&db, &clock, 1, first.id).await?;
        assert!(matches!(
            soft_delete_income_allocation(&db, &clock, 1, first.id).await,
            Err(Error::NotFound { entity: "income allocation", .. })
        ));
        add_income_allocation(&db, 1, salary.id, checking.id, dec!(0.5)).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_income_allocation_percentage_range() -> Result<()> {
        let db = setup_test_db().await?;
        let checking = create_test_account(&db, 1, "Checking").await?;
        let salary = create_test_income(&db, 1, dec!(1000), Frequency::Monthly).await?;

        assert!(add_income_allocation(&db, 1, salary.id, checking.id, dec!(1.5)).await.is_err());
        assert!(add_income_allocation(&db, 1, salary.id, checking.id, dec!(-0.5)).await.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_allocation_requires_owned_account() -> Result<()> {
        let db = setup_test_db().await?;
        let foreign = create_test_account(&db, 2, "Theirs").await?;
        let salary = create_test_income(&db, 1, dec!(1000), Frequency::Monthly).await?;

        let result = add_income_allocation(&db, 1, salary.id, foreign.id, dec!(0.5)).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "account", .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_saving_movements_use_fixed_amount() -> Result<()> {
        let db = setup_test_db().await?;
        let vault = create_test_account(&db, 1, "Vault").await?;
        let holiday = create_test_saving(&db, 1, dec!(500), Frequency::Monthly).await?;

        add_saving_allocation(&db, 1, holiday.id, vault.id, dec!(120)).await?;
        assert!(add_saving_allocation(&db, 1, holiday.id, vault.id, dec!(-1)).await.is_err());

        let allocations = list_saving_allocations(&db, 1, holiday.id).await?;
        assert!(list_saving_allocations(&db, 2, holiday.id).await.is_err());
        let movements = saving_movements(&holiday, &allocations);
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].magnitude, dec!(120));
        assert_eq!(movements[0].signed_amount(), dec!(-120));

        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_skips_deleted_accounts() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 10);
        let checking = create_test_account(&db, 1, "Checking").await?;
        let closed = create_test_account(&db, 1, "Closed").await?;
        let salary = create_test_income(&db, 1, dec!(1000), Frequency::Monthly).await?;
        add_income_allocation(&db, 1, salary.id, checking.id, dec!(0.5)).await?;
        add_income_allocation(&db, 1, salary.id, closed.id, dec!(0.5)).await?;
        crate::core::account::soft_delete_account(&db, &clock, 1, closed.id).await?;

        let recurrence =
            create_test_recurrence(&db, &clock, 1, checking.id, ItemRef::Income(salary.id)).await?;
        let movements =
            resolve_movements(&db, &recurrence, &RecurringItem::Income(salary)).await?;
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].account_id, checking.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_expense_never_fans_out() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 10);
        let checking = create_test_account(&db, 1, "Checking").await?;
        let rent = create_test_expense(&db, 1, dec!(900), Frequency::Monthly).await?;

        let recurrence =
            create_test_recurrence(&db, &clock, 1, checking.id, ItemRef::Expense(rent.id)).await?;
        let movements =
            resolve_movements(&db, &recurrence, &RecurringItem::Expense(rent.clone())).await?;
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].magnitude, dec!(900));
        assert_eq!(movements[0].source, Some(Source::Expense(rent.id)));

        Ok(())
    }
}
