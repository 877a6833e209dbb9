//! Saving entity - Money set aside, possibly recurring.

use super::enums::Frequency;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Saving database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "savings")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who owns the saving
    pub owner_id: i64,
    /// Display name (e.g. "Holiday fund")
    pub name: String,
    /// Amount per occurrence, never negative
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    /// How often the saving recurs
    pub frequency: Frequency,
    /// Day of month (1-31), only meaningful for [`Frequency::Other`]
    pub scheduled_day: Option<i32>,
    /// Template items are reusable blueprints rather than one-off entries
    pub is_template: bool,
    /// Whether the saving is tax related
    pub tax_related: bool,
    /// Tax referenced when `tax_related` is set
    pub tax_id: Option<i64>,
    /// When the saving was created
    pub created_at: DateTimeUtc,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the saving was soft-deleted
    pub deleted_at: Option<DateTimeUtc>,
}

/// Defines relationships between Saving and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One saving is split by many allocations
    #[sea_orm(has_many = "super::saving_allocation::Entity")]
    Allocations,
    /// Optional tax reference
    #[sea_orm(
        belongs_to = "super::tax::Entity",
        from = "Column::TaxId",
        to = "super::tax::Column::Id"
    )]
    Tax,
}

impl Related<super::saving_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
