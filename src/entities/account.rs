//! Account entity - Where money lives.
//!
//! `balance` is a running total maintained on every transaction insert and
//! soft delete, inside the same database transaction.

use super::enums::AccountType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who owns the account
    pub owner_id: i64,
    /// Display name, unique per owner among active accounts
    pub name: String,
    /// Personal or shared
    pub account_type: AccountType,
    /// Current running balance
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub balance: Decimal,
    /// Whether this is the owner's default account
    pub is_default: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the account was soft-deleted
    pub deleted_at: Option<DateTimeUtc>,
}

/// Defines relationships between Account and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One account has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// One account has many recurrences
    #[sea_orm(has_many = "super::recurrence::Entity")]
    Recurrences,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::recurrence::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recurrences.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
