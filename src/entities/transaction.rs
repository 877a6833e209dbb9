//! Transaction entity - An immutable ledger record of a monetary movement.
//!
//! Amounts are signed: income is positive, expenses and savings are negative.
//! Rows are never edited after insert except for the soft-delete columns.
//! The optional (`source_kind`, `source_id`) pair records what the movement was
//! created from; [`Source`] is the in-memory view of that pair.

use super::enums::{SourceKind, TransactionType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who owns the transaction
    pub owner_id: i64,
    /// Account the movement is booked on
    pub account_id: i64,
    /// Income, expense or saving
    pub transaction_type: TransactionType,
    /// Signed amount (positive for income, negative for expenses and savings)
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    /// Account balance immediately before this transaction was booked
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub previous_balance: Decimal,
    /// What kind of row `source_id` refers to
    pub source_kind: Option<SourceKind>,
    /// Id of the expense, income, saving or allocation this was created from
    pub source_id: Option<i64>,
    /// Human-readable description of the transaction
    pub description: String,
    /// When the transaction was created
    pub created_at: DateTimeUtc,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the transaction was soft-deleted
    pub deleted_at: Option<DateTimeUtc>,
}

impl Model {
    /// What this transaction was created from, if recorded.
    #[must_use]
    pub const fn source(&self) -> Option<Source> {
        match (self.source_kind, self.source_id) {
            (Some(kind), Some(id)) => Some(Source::new(kind, id)),
            _ => None,
        }
    }
}

/// Origin of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// An expense definition
    Expense(i64),
    /// An income definition booked directly
    Income(i64),
    /// A saving definition booked directly
    Saving(i64),
    /// An income allocation row
    IncomeAllocation(i64),
    /// A saving allocation row
    SavingAllocation(i64),
}

impl Source {
    /// Builds the source from its persisted parts.
    #[must_use]
    pub const fn new(kind: SourceKind, id: i64) -> Self {
        match kind {
            SourceKind::Expense => Self::Expense(id),
            SourceKind::Income => Self::Income(id),
            SourceKind::Saving => Self::Saving(id),
            SourceKind::IncomeAllocation => Self::IncomeAllocation(id),
            SourceKind::SavingAllocation => Self::SavingAllocation(id),
        }
    }

    /// Persisted `(source_kind, source_id)` pair.
    #[must_use]
    pub const fn into_parts(self) -> (SourceKind, i64) {
        match self {
            Self::Expense(id) => (SourceKind::Expense, id),
            Self::Income(id) => (SourceKind::Income, id),
            Self::Saving(id) => (SourceKind::Saving, id),
            Self::IncomeAllocation(id) => (SourceKind::IncomeAllocation, id),
            Self::SavingAllocation(id) => (SourceKind::SavingAllocation, id),
        }
    }
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one account
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
