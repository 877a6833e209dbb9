//! Enumerations stored as string columns.
//!
//! Each enum derives `DeriveActiveEnum` so it can be used directly as a model field,
//! and `Serialize`/`Deserialize` with the same upper-case spelling used in the database
//! so `config.toml` and JSON snapshots read the same way.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How often an income, expense or saving recurs.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    /// Every day
    #[sea_orm(string_value = "DAILY")]
    Daily,
    /// Every week
    #[sea_orm(string_value = "WEEKLY")]
    Weekly,
    /// Every month
    #[sea_orm(string_value = "MONTHLY")]
    Monthly,
    /// Every year
    #[sea_orm(string_value = "ANNUAL")]
    Annual,
    /// Twice a month
    #[sea_orm(string_value = "BIWEEKLY")]
    Biweekly,
    /// Monthly on a user-chosen `scheduled_day`
    #[sea_orm(string_value = "OTHER")]
    Other,
}

impl Frequency {
    /// Upper-case name as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Annual => "ANNUAL",
            Self::Biweekly => "BIWEEKLY",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kind of item a recurrence points at.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    /// Recurrence of an income
    #[sea_orm(string_value = "INCOME")]
    Income,
    /// Recurrence of an expense
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    /// Recurrence of a saving
    #[sea_orm(string_value = "SAVING")]
    Saving,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Saving => "saving",
        })
    }
}

/// Direction of a ledger transaction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money in (positive amount)
    #[sea_orm(string_value = "INCOME")]
    Income,
    /// Money out (negative amount)
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    /// Money set aside (negative amount)
    #[sea_orm(string_value = "SAVING")]
    Saving,
}

impl From<ItemKind> for TransactionType {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Income => Self::Income,
            ItemKind::Expense => Self::Expense,
            ItemKind::Saving => Self::Saving,
        }
    }
}

/// What a transaction was created from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    /// An expense definition
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    /// An income definition entered manually
    #[sea_orm(string_value = "INCOME")]
    Income,
    /// A saving definition entered manually
    #[sea_orm(string_value = "SAVING")]
    Saving,
    /// One allocation row of a recurring income
    #[sea_orm(string_value = "INCOME_ALLOCATION")]
    IncomeAllocation,
    /// One allocation row of a recurring saving
    #[sea_orm(string_value = "SAVING_ALLOCATION")]
    SavingAllocation,
}

/// Whether an account belongs to one person or is shared.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Owned by a single user
    #[sea_orm(string_value = "PERSONAL")]
    Personal,
    /// Shared between users
    #[sea_orm(string_value = "SHARED")]
    Shared,
}

/// Lifecycle state of a goal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    /// Proposed, waiting for the user's decision
    #[sea_orm(string_value = "GOAL_PENDING")]
    GoalPending,
    /// Accepted and being worked towards
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Proposal turned down
    #[sea_orm(string_value = "GOAL_REJECTED")]
    GoalRejected,
    /// Target reached
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    /// Abandoned while active
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

impl GoalStatus {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GoalRejected | Self::Completed | Self::Failed)
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GoalPending => "GOAL_PENDING",
            Self::Active => "ACTIVE",
            Self::GoalRejected => "GOAL_REJECTED",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        })
    }
}

/// What a goal is for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalType {
    /// Build up savings
    #[sea_orm(string_value = "SAVINGS")]
    Savings,
    /// Pay down a debt
    #[sea_orm(string_value = "DEBT_PAYOFF")]
    DebtPayoff,
    /// Save for a purchase
    #[sea_orm(string_value = "PURCHASE")]
    Purchase,
    /// Build an emergency fund
    #[sea_orm(string_value = "EMERGENCY_FUND")]
    EmergencyFund,
    /// Invest a sum
    #[sea_orm(string_value = "INVESTMENT")]
    Investment,
    /// Anything else
    #[sea_orm(string_value = "OTHER")]
    Other,
}
