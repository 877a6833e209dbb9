//! Income allocation entity - Sends a share of an income to an account.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Income allocation database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "income_allocations")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Income being split
    pub income_id: i64,
    /// Account receiving the share
    pub account_id: i64,
    /// Share of the income amount, in `[0, 1]`
    #[sea_orm(column_type = "Decimal(Some((10, 6)))")]
    pub percentage: Decimal,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the allocation was soft-deleted
    pub deleted_at: Option<DateTimeUtc>,
}

/// Defines relationships between IncomeAllocation and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each allocation belongs to one income
    #[sea_orm(
        belongs_to = "super::income::Entity",
        from = "Column::IncomeId",
        to = "super::income::Column::Id"
    )]
    Income,
    /// Each allocation credits one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
}

impl Related<super::income::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Income.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
