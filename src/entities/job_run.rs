//! Job run entity - Records which scheduled passes have been claimed.
//!
//! One row per (`frequency`, `period_key`). The row is inserted before a pass
//! starts and completed with its statistics when the pass ends.

use super::enums::Frequency;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Job run database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job_runs")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Frequency the pass processed
    pub frequency: Frequency,
    /// Calendar period the pass covered (e.g. `"2024-03"` for a monthly pass)
    pub period_key: String,
    /// When the pass was claimed
    pub started_at: DateTimeUtc,
    /// When the pass finished, `None` while running or if it crashed
    pub finished_at: Option<DateTimeUtc>,
    /// Transactions created by the pass
    pub transactions_created: Option<i32>,
    /// Recurrences that failed during the pass
    pub failures: Option<i32>,
}

/// `JobRun` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
