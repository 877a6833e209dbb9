//! Income entity - A source of money, possibly recurring.
//!
//! A recurring income is split across accounts by its
//! [`income_allocation`](super::income_allocation) rows.

use super::enums::Frequency;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Income database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "incomes")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who owns the income
    pub owner_id: i64,
    /// Display name (e.g. "Salary")
    pub name: String,
    /// Amount per occurrence, never negative
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    /// How often the income recurs
    pub frequency: Frequency,
    /// Day of month (1-31), only meaningful for [`Frequency::Other`]
    pub scheduled_day: Option<i32>,
    /// Template items are reusable blueprints rather than one-off entries
    pub is_template: bool,
    /// Whether the income is subject to a tax
    pub tax_related: bool,
    /// Tax applied when `tax_related` is set
    pub tax_id: Option<i64>,
    /// When the income was created
    pub created_at: DateTimeUtc,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the income was soft-deleted
    pub deleted_at: Option<DateTimeUtc>,
}

/// Defines relationships between Income and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One income is split by many allocations
    #[sea_orm(has_many = "super::income_allocation::Entity")]
    Allocations,
    /// Optional tax reference
    #[sea_orm(
        belongs_to = "super::tax::Entity",
        from = "Column::TaxId",
        to = "super::tax::Column::Id"
    )]
    Tax,
}

impl Related<super::income_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
