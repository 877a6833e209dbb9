//! Tax entity - A tax that incomes, expenses or savings may reference.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tax database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "taxes")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who owns the tax entry
    pub owner_id: i64,
    /// Display name (e.g. "Income tax")
    pub name: String,
    /// Rate as a fraction in `[0, 1]`
    #[sea_orm(column_type = "Decimal(Some((10, 6)))")]
    pub rate: Decimal,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the tax was soft-deleted
    pub deleted_at: Option<DateTimeUtc>,
}

/// `Tax` is only referenced, never navigated from
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
