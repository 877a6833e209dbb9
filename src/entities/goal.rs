//! Goal entity - A financial target with a status lifecycle.
//!
//! See [`crate::core::goal`] for the allowed status transitions.

use super::enums::{GoalStatus, GoalType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Goal database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who owns the goal
    pub owner_id: i64,
    /// Account the goal is tracked on, if any
    pub account_id: Option<i64>,
    /// Saving that funds the goal, if any
    pub saving_id: Option<i64>,
    /// Short title
    pub name: String,
    /// Longer explanation, usually from the proposal generator
    pub description: Option<String>,
    /// What the goal is for
    pub goal_type: GoalType,
    /// Lifecycle state
    pub status: GoalStatus,
    /// Amount to reach
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub target_amount: Decimal,
    /// Amount already available when the goal was created
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub initial_amount: Decimal,
    /// Date by which the target should be reached
    pub target_date: Date,
    /// When the goal was created
    pub created_at: DateTimeUtc,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the goal was soft-deleted
    pub deleted_at: Option<DateTimeUtc>,
}

/// `Goal` references accounts and savings by id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
