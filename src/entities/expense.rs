//! Expense entity - Money going out, possibly recurring.

use super::enums::Frequency;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who owns the expense
    pub owner_id: i64,
    /// Display name (e.g. "Rent")
    pub name: String,
    /// Amount per occurrence, never negative
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    /// How often the expense recurs
    pub frequency: Frequency,
    /// Day of month (1-31), only meaningful for [`Frequency::Other`]
    pub scheduled_day: Option<i32>,
    /// Reporting category, `None` means uncategorized
    pub category_id: Option<i64>,
    /// Template items are reusable blueprints rather than one-off entries
    pub is_template: bool,
    /// Whether the expense is tax related
    pub tax_related: bool,
    /// Tax referenced when `tax_related` is set
    pub tax_id: Option<i64>,
    /// When the expense was created
    pub created_at: DateTimeUtc,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the expense was soft-deleted
    pub deleted_at: Option<DateTimeUtc>,
}

/// Defines relationships between Expense and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each expense may belong to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// Optional tax reference
    #[sea_orm(
        belongs_to = "super::tax::Entity",
        from = "Column::TaxId",
        to = "super::tax::Column::Id"
    )]
    Tax,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
