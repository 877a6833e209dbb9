//! Recurrence entity - A standing link between an owner, an account and one
//! recurring income, expense or saving.
//!
//! The item is persisted as a (`kind`, `item_id`) pair so a row can never point at
//! more than one item. [`ItemRef`] is the in-memory view of that pair.

use super::enums::ItemKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recurrence database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurrences")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who owns the recurrence
    pub owner_id: i64,
    /// Account the recurrence books against
    pub account_id: i64,
    /// Which table `item_id` refers to
    pub kind: ItemKind,
    /// Id of the income, expense or saving
    pub item_id: i64,
    /// When the recurrence was set up
    pub created_at: DateTimeUtc,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the recurrence was soft-deleted
    pub deleted_at: Option<DateTimeUtc>,
}

impl Model {
    /// The item this recurrence points at.
    #[must_use]
    pub const fn item(&self) -> ItemRef {
        ItemRef::new(self.kind, self.item_id)
    }
}

/// Reference to exactly one recurring item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemRef {
    /// An income id
    Income(i64),
    /// An expense id
    Expense(i64),
    /// A saving id
    Saving(i64),
}

impl ItemRef {
    /// Builds the reference from its persisted parts.
    #[must_use]
    pub const fn new(kind: ItemKind, id: i64) -> Self {
        match kind {
            ItemKind::Income => Self::Income(id),
            ItemKind::Expense => Self::Expense(id),
            ItemKind::Saving => Self::Saving(id),
        }
    }

    /// Kind column value.
    #[must_use]
    pub const fn kind(self) -> ItemKind {
        match self {
            Self::Income(_) => ItemKind::Income,
            Self::Expense(_) => ItemKind::Expense,
            Self::Saving(_) => ItemKind::Saving,
        }
    }

    /// Item id column value.
    #[must_use]
    pub const fn id(self) -> i64 {
        match self {
            Self::Income(id) | Self::Expense(id) | Self::Saving(id) => id,
        }
    }
}

/// Defines relationships between Recurrence and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each recurrence books against one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
