//! Balance aggregator - Month-to-date totals and recurring projections.
//!
//! Monthly totals sum the signed amounts of income and expense transactions
//! created in the clock's current calendar month, so `monthly_expense` comes out
//! negative. Saving transactions are not counted. Recurring totals sum the item
//! amounts of active income and expense recurrences; the expense total is
//! negated before it is returned. There is no recurring saving total.

use crate::{
    clock::Clock,
    core::{account, item::RecurringItem, recurrence},
    entities::{Transaction, TransactionType, transaction},
    errors::Result,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::{QuerySelect, prelude::*};
use serde::Serialize;

/// What to aggregate over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceScope {
    /// A single account
    Account(i64),
    /// Every account of an owner
    User(i64),
}

/// Aggregated balances for a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    /// Signed sum of this month's expense transactions
    pub monthly_expense: Decimal,
    /// Sum of this month's income transactions
    pub monthly_income: Decimal,
    /// Negated sum of recurring expense amounts
    pub recurrent_expense: Decimal,
    /// Sum of recurring income amounts
    pub recurrent_income: Decimal,
}

/// `[start, end)` of the calendar month containing `today`, as UTC instants.
fn month_bounds(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = today.with_day(1).unwrap_or(today);
    let end = start
        .checked_add_months(chrono::Months::new(1))
        .unwrap_or(NaiveDate::MAX);
    (
        start.and_time(chrono::NaiveTime::MIN).and_utc(),
        end.and_time(chrono::NaiveTime::MIN).and_utc(),
    )
}

/// Folds transactions and recurring item amounts into [`Balances`].
///
/// `transactions` must already be restricted to the current month.
#[must_use]
pub fn aggregate<'a>(
    transactions: impl IntoIterator<Item = &'a transaction::Model>,
    recurring_expenses: impl IntoIterator<Item = Decimal>,
    recurring_incomes: impl IntoIterator<Item = Decimal>,
) -> Balances {
    let mut balances = Balances::default();
    for t in transactions {
        match t.transaction_type {
            TransactionType::Expense => balances.monthly_expense += t.amount,
            TransactionType::Income => balances.monthly_income += t.amount,
            TransactionType::Saving => {}
        }
    }
    let expense_total: Decimal = recurring_expenses.into_iter().sum();
    balances.recurrent_expense = -expense_total;
    balances.recurrent_income = recurring_incomes.into_iter().sum();
    balances
}

/// Computes [`Balances`] for `scope` as of `clock.today()`.
pub async fn compute_balances<C>(db: &C, clock: &dyn Clock, scope: BalanceScope) -> Result<Balances>
where
    C: ConnectionTrait,
{
    let (start, end) = month_bounds(clock.today());

    let mut query = Transaction::find()
        .filter(transaction::Column::IsDeleted.eq(false))
        .filter(transaction::Column::CreatedAt.gte(start))
        .filter(transaction::Column::CreatedAt.lt(end));
    query = match scope {
        BalanceScope::Account(id) => query.filter(transaction::Column::AccountId.eq(id)),
        BalanceScope::User(id) => query.filter(transaction::Column::OwnerId.eq(id)),
    };
    let transactions = query.all(db).await?;

    let recurrences = match scope {
        BalanceScope::Account(id) => recurrence::find_by_account(db, id).await?,
        BalanceScope::User(id) => recurrence::find_by_owner(db, id).await?,
    };
    let resolved = recurrence::resolve_items(db, recurrences).await?;

    let mut expenses = Vec::new();
    let mut incomes = Vec::new();
    for entry in &resolved {
        match &entry.item {
            RecurringItem::Expense(e) => expenses.push(e.amount),
            RecurringItem::Income(i) => incomes.push(i.amount),
            RecurringItem::Saving(_) => {}
        }
    }

    Ok(aggregate(&transactions, expenses, incomes))
}

/// The maintained running balance of one account.
pub async fn account_balance<C>(db: &C, owner_id: i64, account_id: i64) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    Ok(account::get_account_for_owner(db, owner_id, account_id)
        .await?
        .balance)
}

/// Sums the account's active transactions. Matches [`account_balance`] unless
/// the running balance has drifted.
pub async fn recompute_account_balance<C>(db: &C, owner_id: i64, account_id: i64) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let account = account::get_account_for_owner(db, owner_id, account_id).await?;

    let amounts: Vec<Decimal> = Transaction::find()
        .select_only()
        .column(transaction::Column::Amount)
        .filter(transaction::Column::AccountId.eq(account.id))
        .filter(transaction::Column::IsDeleted.eq(false))
        .into_tuple::<Decimal>()
        .all(db)
        .await?;

    Ok(amounts.into_iter().sum())
}
