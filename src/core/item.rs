//! Income, expense and saving definitions.
//!
//! The three share one shape ([`NewItem`]) and one validation path. Once loaded they
//! are handled through [`RecurringItem`], which carries exactly one of the three.

use crate::{
    clock::Clock,
    core::catalog,
    entities::{
        Expense, Frequency, Income, ItemKind, ItemRef, Saving, expense, income, saving,
    },
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// Input for creating an income, expense or saving.
#[derive(Debug, Clone)]
pub struct NewItem {
    /// Owner of the new item
    pub owner_id: i64,
    /// Display name
    pub name: String,
    /// Amount per occurrence, must not be negative
    pub amount: Decimal,
    /// How often it recurs
    pub frequency: Frequency,
    /// Day of month, required for [`Frequency::Other`] and ignored otherwise
    pub scheduled_day: Option<i32>,
    /// Reusable blueprint rather than a one-off entry
    pub is_template: bool,
    /// Tax applied, if any. Setting it marks the item as tax related.
    pub tax_id: Option<i64>,
    /// Category, expenses only
    pub category_id: Option<i64>,
}

impl NewItem {
    /// A non-template item with no tax, category or scheduled day.
    #[must_use]
    pub fn new(owner_id: i64, name: impl Into<String>, amount: Decimal, frequency: Frequency) -> Self {
        Self {
            owner_id,
            name: name.into(),
            amount,
            frequency,
            scheduled_day: None,
            is_template: false,
            tax_id: None,
            category_id: None,
        }
    }
}

/// A loaded income, expense or saving.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "item", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurringItem {
    /// An income
    Income(income::Model),
    /// An expense
    Expense(expense::Model),
    /// A saving
    Saving(saving::Model),
}

impl RecurringItem {
    /// Which of the three this is.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::Income(_) => ItemKind::Income,
            Self::Expense(_) => ItemKind::Expense,
            Self::Saving(_) => ItemKind::Saving,
        }
    }

    /// Primary key of the underlying row.
    #[must_use]
    pub const fn id(&self) -> i64 {
        match self {
            Self::Income(m) => m.id,
            Self::Expense(m) => m.id,
            Self::Saving(m) => m.id,
        }
    }

    /// Owner of the underlying row.
    #[must_use]
    pub const fn owner_id(&self) -> i64 {
        match self {
            Self::Income(m) => m.owner_id,
            Self::Expense(m) => m.owner_id,
            Self::Saving(m) => m.owner_id,
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Income(m) => &m.name,
            Self::Expense(m) => &m.name,
            Self::Saving(m) => &m.name,
        }
    }

    /// Amount per occurrence.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        match self {
            Self::Income(m) => m.amount,
            Self::Expense(m) => m.amount,
            Self::Saving(m) => m.amount,
        }
    }

    /// Recurrence frequency.
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        match self {
            Self::Income(m) => m.frequency,
            Self::Expense(m) => m.frequency,
            Self::Saving(m) => m.frequency,
        }
    }

    /// Day of month for [`Frequency::Other`] items.
    #[must_use]
    pub const fn scheduled_day(&self) -> Option<i32> {
        match self {
            Self::Income(m) => m.scheduled_day,
            Self::Expense(m) => m.scheduled_day,
            Self::Saving(m) => m.scheduled_day,
        }
    }

    /// Soft delete flag.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        match self {
            Self::Income(m) => m.is_deleted,
            Self::Expense(m) => m.is_deleted,
            Self::Saving(m) => m.is_deleted,
        }
    }

    /// Reference form, as stored on a recurrence.
    #[must_use]
    pub const fn item_ref(&self) -> ItemRef {
        ItemRef::new(self.kind(), self.id())
    }
}

/// Checks the fields every item kind shares and normalizes the name and scheduled day.
fn validate_new_item(item: &mut NewItem) -> Result<()> {
    item.name = item.name.trim().to_string();
    if item.name.is_empty() {
        return Err(Error::validation("name", "Name cannot be empty"));
    }
    if item.amount < Decimal::ZERO {
        return Err(Error::validation(
            "amount",
            format!("Amount cannot be negative: {}", item.amount),
        ));
    }

    if item.frequency == Frequency::Other {
        match item.scheduled_day {
            Some(day) if (1..=31).contains(&day) => {}
            Some(day) => {
                return Err(Error::validation(
                    "scheduled_day",
                    format!("{day} is outside 1-31"),
                ));
            }
            None => {
                return Err(Error::validation(
                    "scheduled_day",
                    "Required when frequency is OTHER",
                ));
            }
        }
    } else {
        item.scheduled_day = None;
    }
    Ok(())
}

async fn check_references<C>(db: &C, item: &NewItem, kind: ItemKind) -> Result<()>
where
    C: ConnectionTrait,
{
    if let Some(tax_id) = item.tax_id {
        catalog::get_tax_for_owner(db, item.owner_id, tax_id).await?;
    }
    match (kind, item.category_id) {
        (ItemKind::Expense, Some(category_id)) => {
            catalog::get_category_for_owner(db, item.owner_id, category_id).await?;
        }
        (_, Some(_)) => {
            return Err(Error::validation(
                "category_id",
                format!("Only expenses have a category, not a {kind}"),
            ));
        }
        (_, None) => {}
    }
    Ok(())
}

/// Creates an income definition.
pub async fn create_income(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    mut item: NewItem,
) -> Result<income::Model> {
    validate_new_item(&mut item)?;
    check_references(db, &item, ItemKind::Income).await?;

    let model = income::ActiveModel {
        owner_id: Set(item.owner_id),
        name: Set(item.name),
        amount: Set(item.amount),
        frequency: Set(item.frequency),
        scheduled_day: Set(item.scheduled_day),
        is_template: Set(item.is_template),
        tax_related: Set(item.tax_id.is_some()),
        tax_id: Set(item.tax_id),
        created_at: Set(clock.now()),
        is_deleted: Set(false),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(income_id = model.id, frequency = %model.frequency, "Created income");
    Ok(model)
}

/// Creates an expense definition.
pub async fn create_expense(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    mut item: NewItem,
) -> Result<expense::Model> {
    validate_new_item(&mut item)?;
    check_references(db, &item, ItemKind::Expense).await?;

    let model = expense::ActiveModel {
        owner_id: Set(item.owner_id),
        name: Set(item.name),
        amount: Set(item.amount),
        frequency: Set(item.frequency),
        scheduled_day: Set(item.scheduled_day),
        category_id: Set(item.category_id),
        is_template: Set(item.is_template),
        tax_related: Set(item.tax_id.is_some()),
        tax_id: Set(item.tax_id),
        created_at: Set(clock.now()),
        is_deleted: Set(false),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(expense_id = model.id, frequency = %model.frequency, "Created expense");
    Ok(model)
}

/// Creates a saving definition.
pub async fn create_saving(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    mut item: NewItem,
) -> Result<saving::Model> {
    validate_new_item(&mut item)?;
    check_references(db, &item, ItemKind::Saving).await?;

    let model = saving::ActiveModel {
        owner_id: Set(item.owner_id),
        name: Set(item.name),
        amount: Set(item.amount),
        frequency: Set(item.frequency),
        scheduled_day: Set(item.scheduled_day),
        is_template: Set(item.is_template),
        tax_related: Set(item.tax_id.is_some()),
        tax_id: Set(item.tax_id),
        created_at: Set(clock.now()),
        is_deleted: Set(false),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(saving_id = model.id, frequency = %model.frequency, "Created saving");
    Ok(model)
}

/// Loads the referenced item regardless of owner or delete flag.
pub async fn find_item<C>(db: &C, item: ItemRef) -> Result<Option<RecurringItem>>
where
    C: ConnectionTrait,
{
    Ok(match item {
        ItemRef::Income(id) => Income::find_by_id(id).one(db).await?.map(RecurringItem::Income),
        ItemRef::Expense(id) => Expense::find_by_id(id)
            .one(db)
            .await?
            .map(RecurringItem::Expense),
        ItemRef::Saving(id) => Saving::find_by_id(id).one(db).await?.map(RecurringItem::Saving),
    })
}

/// Loads an active item belonging to `owner_id`.
///
/// # Errors
/// Returns [`Error::NotFound`] if the item is missing, deleted or owned by someone else.
pub async fn get_item_for_owner<C>(db: &C, owner_id: i64, item: ItemRef) -> Result<RecurringItem>
where
    C: ConnectionTrait,
{
    find_item(db, item)
        .await?
        .filter(|found| found.owner_id() == owner_id && !found.is_deleted())
        .ok_or_else(|| Error::not_found(entity_name(item.kind()), item.id()))
}

const fn entity_name(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Income => "income",
        ItemKind::Expense => "expense",
        ItemKind::Saving => "saving",
    }
}

/// Loads items of one kind by id, keyed by id. Missing ids are simply absent.
pub async fn load_items<C>(db: &C, kind: ItemKind, ids: Vec<i64>) -> Result<HashMap<i64, RecurringItem>>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let items: Vec<RecurringItem> = match kind {
        ItemKind::Income => Income::find()
            .filter(income::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(RecurringItem::Income)
            .collect(),
        ItemKind::Expense => Expense::find()
            .filter(expense::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(RecurringItem::Expense)
            .collect(),
        ItemKind::Saving => Saving::find()
            .filter(saving::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(RecurringItem::Saving)
            .collect(),
    };
    Ok(items.into_iter().map(|item| (item.id(), item)).collect())
}

/// Active items of one kind whose frequency is one of `frequencies`.
pub async fn find_items_by_frequency<C>(
    db: &C,
    kind: ItemKind,
    frequencies: &[Frequency],
) -> Result<Vec<RecurringItem>>
where
    C: ConnectionTrait,
{
    let frequencies = frequencies.to_vec();
    Ok(match kind {
        ItemKind::Income => Income::find()
            .filter(income::Column::Frequency.is_in(frequencies))
            .filter(income::Column::IsDeleted.eq(false))
            .all(db)
            .await?
            .into_iter()
            .map(RecurringItem::Income)
            .collect(),
        ItemKind::Expense => Expense::find()
            .filter(expense::Column::Frequency.is_in(frequencies))
            .filter(expense::Column::IsDeleted.eq(false))
            .all(db)
            .await?
            .into_iter()
            .map(RecurringItem::Expense)
            .collect(),
        ItemKind::Saving => Saving::find()
            .filter(saving::Column::Frequency.is_in(frequencies))
            .filter(saving::Column::IsDeleted.eq(false))
            .all(db)
            .await?
            .into_iter()
            .map(RecurringItem::Saving)
            .collect(),
    })
}

/// Soft-deletes an income, expense or saving.
pub async fn soft_delete_item(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    item: ItemRef,
) -> Result<RecurringItem> {
    let now = Some(clock.now());
    let updated = match get_item_for_owner(db, owner_id, item).await? {
        RecurringItem::Income(model) => {
            let mut active: income::ActiveModel = model.into();
            active.is_deleted = Set(true);
            active.deleted_at = Set(now);
            RecurringItem::Income(active.update(db).await?)
        }
        RecurringItem::Expense(model) => {
            let mut active: expense::ActiveModel = model.into();
            active.is_deleted = Set(true);
            active.deleted_at = Set(now);
            RecurringItem::Expense(active.update(db).await?)
        }
        RecurringItem::Saving(model) => {
            let mut active: saving::ActiveModel = model.into();
            active.is_deleted = Set(true);
            active.deleted_at = Set(now);
            RecurringItem::Saving(active.update(db).await?)
        }
    };
    info!(kind = %item.kind(), id = item.id(), "Soft-deleted item");
    Ok(updated)
}
