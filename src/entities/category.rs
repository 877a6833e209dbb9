//! Category entity - Groups expenses for reporting.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who owns the category
    pub owner_id: i64,
    /// Display name (e.g. "Food")
    pub name: String,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the category was soft-deleted
    pub deleted_at: Option<DateTimeUtc>,
}

/// One category has many expenses
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Expenses filed under this category
    #[sea_orm(has_many = "super::expense::Entity")]
    Expenses,
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
