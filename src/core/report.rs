//! Report generation business logic.
//!
//! Yearly reports bucket amounts by category and month. Two sources feed them:
//! active recurrences, counted once at the month they were created, and
//! transactions of the requested type, counted by magnitude at the month they
//! were booked. Incomes have no categories and all land in
//! [`UNCATEGORIZED`](crate::core::catalog::UNCATEGORIZED).

use crate::{
    core::{catalog::UNCATEGORIZED, item::RecurringItem, recurrence},
    entities::{
        Category, CategoryColumn, Expense, ExpenseColumn, Goal, GoalColumn, GoalStatus, Source,
        Transaction, TransactionColumn, TransactionType,
    },
    errors::Result,
};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{Iterable, prelude::*};
use std::collections::{BTreeMap, HashMap, HashSet};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Which side of the ledger a yearly report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Incomes
    Income,
    /// Expenses
    Expense,
}

/// Category name to month abbreviation to summed amount.
pub type YearlyReport = BTreeMap<String, BTreeMap<String, Decimal>>;

/// Lower-case three-letter English abbreviation of a month (1-12).
#[must_use]
pub fn month_abbrev(month: u32) -> &'static str {
    MONTHS[(month.clamp(1, 12) - 1) as usize]
}

fn add_to(report: &mut YearlyReport, category: &str, at: DateTime<Utc>, amount: Decimal) {
    *report
        .entry(category.to_string())
        .or_default()
        .entry(month_abbrev(at.month()).to_string())
        .or_default() += amount;
}

/// Resolves expense ids to the name of their active category.
async fn expense_categories<C>(db: &C, expense_ids: HashSet<i64>) -> Result<HashMap<i64, String>>
where
    C: ConnectionTrait,
{
    if expense_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let expenses = Expense::find()
        .filter(ExpenseColumn::Id.is_in(expense_ids))
        .all(db)
        .await?;

    let category_ids: Vec<i64> = expenses.iter().filter_map(|e| e.category_id).collect();
    let categories: HashMap<i64, String> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        Category::find()
            .filter(CategoryColumn::Id.is_in(category_ids))
            .filter(CategoryColumn::IsDeleted.eq(false))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect()
    };

    Ok(expenses
        .into_iter()
        .filter_map(|e| {
            let name = categories.get(&e.category_id?)?.clone();
            Some((e.id, name))
        })
        .collect())
}

/// Yearly totals for `owner_id`, by category and month.
///
/// Months without activity are absent rather than zero.
pub async fn yearly_by_category<C>(
    db: &C,
    kind: ReportKind,
    year: i32,
    owner_id: i64,
) -> Result<YearlyReport>
where
    C: ConnectionTrait,
{
    let recurrences = recurrence::find_by_owner(db, owner_id).await?;
    let recurring: Vec<_> = recurrence::resolve_items(db, recurrences)
        .await?
        .into_iter()
        .filter(|r| r.recurrence.created_at.year() == year)
        .filter(|r| match (&r.item, kind) {
            (RecurringItem::Income(_), ReportKind::Income)
            | (RecurringItem::Expense(_), ReportKind::Expense) => true,
            _ => false,
        })
        .collect();

    let transaction_type = match kind {
        ReportKind::Income => TransactionType::Income,
        ReportKind::Expense => TransactionType::Expense,
    };
    let transactions: Vec<_> = Transaction::find()
        .filter(TransactionColumn::OwnerId.eq(owner_id))
        .filter(TransactionColumn::TransactionType.eq(transaction_type))
        .filter(TransactionColumn::IsDeleted.eq(false))
        .all(db)
        .await?
        .into_iter()
        .filter(|t| t.created_at.year() == year)
        .collect();

    let mut expense_ids: HashSet<i64> = recurring.iter().map(|r| r.item.id()).collect();
    expense_ids.extend(transactions.iter().filter_map(|t| match t.source() {
        Some(Source::Expense(id)) => Some(id),
        _ => None,
    }));
    let categories = match kind {
        ReportKind::Expense => expense_categories(db, expense_ids).await?,
        ReportKind::Income => HashMap::new(),
    };
    let category_of = |expense_id: Option<i64>| {
        expense_id
            .and_then(|id| categories.get(&id))
            .map_or(UNCATEGORIZED, String::as_str)
    };

    let mut report = YearlyReport::new();
    for r in &recurring {
        let expense_id = matches!(r.item, RecurringItem::Expense(_)).then(|| r.item.id());
        add_to(&mut report, category_of(expense_id), r.recurrence.created_at, r.item.amount());
    }
    for t in &transactions {
        let expense_id = match t.source() {
            Some(Source::Expense(id)) => Some(id),
            _ => None,
        };
        add_to(&mut report, category_of(expense_id), t.created_at, t.amount.abs());
    }

    Ok(report)
}

/// Number of goals in each status, deleted goals included.
///
/// Every status is present, with zero when the owner has no goal in it.
pub async fn goals_progress_by_status<C>(db: &C, owner_id: i64) -> Result<BTreeMap<GoalStatus, u64>>
where
    C: ConnectionTrait,
{
    let mut counts: BTreeMap<GoalStatus, u64> = GoalStatus::iter().map(|s| (s, 0)).collect();

    let goals = Goal::find()
        .filter(GoalColumn::OwnerId.eq(owner_id))
        .all(db)
        .await?;
    for goal in goals {
        *counts.entry(goal.status).or_default() += 1;
    }

    Ok(counts)
}
