//! Saving allocation entity - Sends a fixed amount of a saving to an account.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Saving allocation database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "saving_allocations")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Saving being split
    pub saving_id: i64,
    /// Account the amount is set aside in
    pub account_id: i64,
    /// Absolute amount moved per occurrence
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the allocation was soft-deleted
    pub deleted_at: Option<DateTimeUtc>,
}

/// Defines relationships between SavingAllocation and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each allocation belongs to one saving
    #[sea_orm(
        belongs_to = "super::saving::Entity",
        from = "Column::SavingId",
        to = "super::saving::Column::Id"
    )]
    Saving,
    /// Each allocation debits one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
}

impl Related<super::saving::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Saving.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
