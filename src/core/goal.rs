//! Goal business logic - Status transitions and the proposal flow.
//!
//! ```text
//! GOAL_PENDING --accept--> ACTIVE --complete--> COMPLETED
//!      |                      |
//!   reject/delete           delete
//!      v                      v
//! GOAL_REJECTED             FAILED
//! ```
//!
//! Deleting always soft-deletes the goal as well. Deleting a goal that already
//! reached a terminal status keeps that status.

use crate::{
    clock::Clock,
    core::{
        account,
        balance::{self, BalanceScope},
        item, recurrence,
    },
    entities::{Goal, GoalColumn, GoalStatus, GoalType, ItemRef, goal},
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

/// User action on a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalAction {
    /// Take on a proposed goal
    Accept,
    /// Turn down a proposed goal
    Reject,
    /// Mark an active goal as reached
    Complete,
    /// Remove the goal
    Delete,
}

/// Status a goal moves to when `action` is applied in `status`.
///
/// # Errors
/// Returns [`Error::Validation`] when the action is not allowed in `status`.
pub fn transition(status: GoalStatus, action: GoalAction) -> Result<GoalStatus> {
    use GoalAction::{Accept, Complete, Delete, Reject};

    match (status, action) {
        (GoalStatus::GoalPending, Accept) => Ok(GoalStatus::Active),
        (GoalStatus::GoalPending, Reject | Delete) => Ok(GoalStatus::GoalRejected),
        (GoalStatus::Active, Complete) => Ok(GoalStatus::Completed),
        (GoalStatus::Active, Delete) => Ok(GoalStatus::Failed),
        (terminal, Delete) if terminal.is_terminal() => Ok(terminal),
        (_, Accept | Reject) => Err(Error::validation(
            "status",
            format!("Goal is not pending (status {status})"),
        )),
        (_, Complete) => Err(Error::validation(
            "status",
            format!("Only active goals can be completed (status {status})"),
        )),
        (_, Delete) => Err(Error::validation(
            "status",
            format!("Goal cannot be deleted in status {status}"),
        )),
    }
}

/// Fields of a goal to create.
#[derive(Debug, Clone)]
pub struct NewGoal {
    /// Owner of the goal
    pub owner_id: i64,
    /// Short title
    pub name: String,
    /// Longer explanation
    pub description: Option<String>,
    /// What the goal is for
    pub goal_type: GoalType,
    /// Amount to reach, must be positive
    pub target_amount: Decimal,
    /// Amount already available
    pub initial_amount: Decimal,
    /// Deadline
    pub target_date: NaiveDate,
    /// Account the goal is tracked on
    pub account_id: Option<i64>,
    /// Saving that funds the goal
    pub saving_id: Option<i64>,
}

/// Creates a goal in [`GoalStatus::GoalPending`].
pub async fn create_goal(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    new_goal: NewGoal,
) -> Result<goal::Model> {
    let name = new_goal.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("name", "Goal name cannot be empty"));
    }
    if new_goal.target_amount <= Decimal::ZERO {
        return Err(Error::validation("target_amount", "Target amount must be positive"));
    }
    if new_goal.initial_amount < Decimal::ZERO {
        return Err(Error::validation("initial_amount", "Initial amount cannot be negative"));
    }
    if new_goal.target_date < clock.today() {
        return Err(Error::validation(
            "target_date",
            format!("{} is in the past", new_goal.target_date),
        ));
    }
    if let Some(account_id) = new_goal.account_id {
        account::get_account_for_owner(db, new_goal.owner_id, account_id).await?;
    }
    if let Some(saving_id) = new_goal.saving_id {
        item::get_item_for_owner(db, new_goal.owner_id, ItemRef::Saving(saving_id)).await?;
    }

    let model = goal::ActiveModel {
        owner_id: Set(new_goal.owner_id),
        account_id: Set(new_goal.account_id),
        saving_id: Set(new_goal.saving_id),
        name: Set(name),
        description: Set(new_goal.description),
        goal_type: Set(new_goal.goal_type),
        status: Set(GoalStatus::GoalPending),
        target_amount: Set(new_goal.target_amount),
        initial_amount: Set(new_goal.initial_amount),
        target_date: Set(new_goal.target_date),
        created_at: Set(clock.now()),
        is_deleted: Set(false),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(goal_id = model.id, owner_id = model.owner_id, "Created goal");
    Ok(model)
}

/// Loads an active goal belonging to `owner_id`.
pub async fn get_goal_for_owner<C>(db: &C, owner_id: i64, goal_id: i64) -> Result<goal::Model>
where
    C: ConnectionTrait,
{
    Goal::find_by_id(goal_id)
        .one(db)
        .await?
        .filter(|g| g.owner_id == owner_id && !g.is_deleted)
        .ok_or_else(|| Error::not_found("goal", goal_id))
}

/// An owner's active goals, oldest first.
pub async fn list_goals<C>(db: &C, owner_id: i64) -> Result<Vec<goal::Model>>
where
    C: ConnectionTrait,
{
    Goal::find()
        .filter(GoalColumn::OwnerId.eq(owner_id))
        .filter(GoalColumn::IsDeleted.eq(false))
        .order_by_asc(GoalColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[instrument(skip(db, clock))]
async fn apply(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    goal_id: i64,
    action: GoalAction,
) -> Result<goal::Model> {
    let txn = db.begin().await?;

    let existing = get_goal_for_owner(&txn, owner_id, goal_id).await?;
    let from = existing.status;
    let to = transition(from, action)?;

    let mut active: goal::ActiveModel = existing.into();
    active.status = Set(to);
    if action == GoalAction::Delete {
        active.is_deleted = Set(true);
        active.deleted_at = Set(Some(clock.now()));
    }
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    info!(goal_id, %from, %to, "Goal status changed");
    Ok(updated)
}

/// Accepts a pending goal.
pub async fn accept_goal(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    goal_id: i64,
) -> Result<goal::Model> {
    apply(db, clock, owner_id, goal_id, GoalAction::Accept).await
}

/// Rejects a pending goal.
pub async fn reject_goal(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    goal_id: i64,
) -> Result<goal::Model> {
    apply(db, clock, owner_id, goal_id, GoalAction::Reject).await
}

/// Marks an active goal as reached.
pub async fn complete_goal(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    goal_id: i64,
) -> Result<goal::Model> {
    apply(db, clock, owner_id, goal_id, GoalAction::Complete).await
}

/// Soft-deletes a goal, rejecting it if pending and failing it if active.
pub async fn delete_goal(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    goal_id: i64,
) -> Result<goal::Model> {
    apply(db, clock, owner_id, goal_id, GoalAction::Delete).await
}

/// A goal suggested by a [`ProposalGenerator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalProposal {
    /// Short title
    pub name: String,
    /// Why the goal was suggested
    pub description: String,
    /// What the goal is for
    pub goal_type: GoalType,
    /// Amount to reach
    pub target_amount: Decimal,
    /// Deadline
    pub target_date: NaiveDate,
}

/// Message for the external notification sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Address or handle of the user to notify
    pub recipient: String,
    /// Subject line
    pub title: String,
    /// Body
    pub message: String,
}

/// Suggests a goal from a JSON snapshot of the owner's finances.
#[async_trait]
pub trait ProposalGenerator: Send + Sync {
    /// Produces one proposal for the given snapshot.
    async fn propose(&self, snapshot: &serde_json::Value) -> Result<GoalProposal>;
}

/// Builds the snapshot handed to a [`ProposalGenerator`].
pub async fn financial_snapshot(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
) -> Result<serde_json::Value> {
    let balances = balance::compute_balances(db, clock, BalanceScope::User(owner_id)).await?;
    let recurrences = recurrence::resolve_items(db, recurrence::find_by_owner(db, owner_id).await?)
        .await?
        .into_iter()
        .map(|r| {
            json!({
                "kind": r.item.kind(),
                "name": r.item.name(),
                "amount": r.item.amount(),
                "frequency": r.item.frequency(),
                "account_id": r.recurrence.account_id,
            })
        })
        .collect::<Vec<_>>();
    let goals = list_goals(db, owner_id).await?;

    Ok(json!({
        "today": clock.today(),
        "balances": serde_json::to_value(&balances)?,
        "recurrences": recurrences,
        "goals": serde_json::to_value(&goals)?,
    }))
}

/// Asks `generator` for a goal, stores it as pending and drafts the notification.
///
/// # Errors
/// Returns [`Error::Proposal`] if the generator fails or proposes a goal that
/// does not validate.
pub async fn propose_goal(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    generator: &dyn ProposalGenerator,
    owner_id: i64,
    recipient: &str,
) -> Result<(goal::Model, Notification)> {
    let snapshot = financial_snapshot(db, clock, owner_id).await?;
    let proposal = generator
        .propose(&snapshot)
        .await
        .map_err(|e| Error::Proposal {
            message: e.to_string(),
        })?;

    let new_goal = NewGoal {
        owner_id,
        name: proposal.name,
        description: Some(proposal.description.clone()),
        goal_type: proposal.goal_type,
        target_amount: proposal.target_amount,
        initial_amount: Decimal::ZERO,
        target_date: proposal.target_date,
        account_id: None,
        saving_id: None,
    };
    let goal = match create_goal(db, clock, new_goal).await {
        Ok(goal) => goal,
        Err(Error::Validation { field, message }) => {
            return Err(Error::Proposal {
                message: format!("Rejected proposal ({field}): {message}"),
            });
        }
        Err(e) => return Err(e),
    };

    let notification = Notification {
        recipient: recipient.to_string(),
        title: format!("New goal suggestion: {}", goal.name),
        message: format!(
            "{}\nTarget: {} by {}. Accept or reject it from your goals.",
            proposal.description, goal.target_amount, goal.target_date
        ),
    };
    Ok((goal, notification))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::report::goals_progress_by_status;
    use crate::entities::Frequency;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    fn new_goal(owner_id: i64) -> NewGoal {
        NewGoal {
            owner_id,
            name: "Emergency fund".to_string(),
            description: None,
            goal_type: GoalType::EmergencyFund,
            target_amount: dec!(5000),
            initial_amount: dec!(250),
            target_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            account_id: None,
            saving_id: None,
        }
    }

    #[test]
    fn test_transition_table() {
        use GoalAction::{Accept, Complete, Delete, Reject};

        assert_eq!(transition(GoalStatus::GoalPending, Accept).unwrap(), GoalStatus::Active);
        assert_eq!(
            transition(GoalStatus::GoalPending, Reject).unwrap(),
            GoalStatus::GoalRejected
        );
        assert_eq!(
            transition(GoalStatus::GoalPending, Delete).unwrap(),
            GoalStatus::GoalRejected
        );
        assert_eq!(transition(GoalStatus::Active, Complete).unwrap(), GoalStatus::Completed);
        assert_eq!(transition(GoalStatus::Active, Delete).unwrap(), GoalStatus::Failed);
        assert_eq!(transition(GoalStatus::Completed, Delete).unwrap(), GoalStatus::Completed);

        for status in [GoalStatus::Active, GoalStatus::Completed, GoalStatus::Failed] {
            assert!(matches!(
                transition(status, Accept),
                Err(Error::Validation { .. })
            ));
            assert!(matches!(
                transition(status, Reject),
                Err(Error::Validation { .. })
            ));
        }
        assert!(transition(GoalStatus::GoalPending, Complete).is_err());
    }

    #[tokio::test]
    async fn test_accept_then_accept_again_fails() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 1);
        let goal = create_goal(&db, &clock, new_goal(1)).await?;
        assert_eq!(goal.status, GoalStatus::GoalPending);

        let accepted = accept_goal(&db, &clock, 1, goal.id).await?;
        assert_eq!(accepted.status, GoalStatus::Active);

        let again = accept_goal(&db, &clock, 1, goal.id).await;
        assert!(matches!(again, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_pending_rejects_and_active_fails() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 1);

        let pending = create_goal(&db, &clock, new_goal(1)).await?;
        let deleted = delete_goal(&db, &clock, 1, pending.id).await?;
        assert_eq!(deleted.status, GoalStatus::GoalRejected);
        assert!(deleted.is_deleted);
        assert_eq!(deleted.deleted_at, Some(clock.now()));

        let active = create_goal(&db, &clock, new_goal(1)).await?;
        accept_goal(&db, &clock, 1, active.id).await?;
        let deleted = delete_goal(&db, &clock, 1, active.id).await?;
        assert_eq!(deleted.status, GoalStatus::Failed);
        assert!(deleted.is_deleted);

        // Deleted goals are gone for interactive use but still counted
        assert!(list_goals(&db, 1).await?.is_empty());
        let counts = goals_progress_by_status(&db, 1).await?;
        assert_eq!(counts[&GoalStatus::GoalRejected], 1);
        assert_eq!(counts[&GoalStatus::Failed], 1);
        assert_eq!(counts[&GoalStatus::Active], 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_complete_requires_active() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 1);
        let goal = create_goal(&db, &clock, new_goal(1)).await?;

        assert!(complete_goal(&db, &clock, 1, goal.id).await.is_err());
        accept_goal(&db, &clock, 1, goal.id).await?;
        let done = complete_goal(&db, &clock, 1, goal.id).await?;
        assert_eq!(done.status, GoalStatus::Completed);
        assert!(!done.is_deleted);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_goal_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 1);

        let mut zero = new_goal(1);
        zero.target_amount = Decimal::ZERO;
        assert!(matches!(
            create_goal(&db, &clock, zero).await,
            Err(Error::Validation { .. })
        ));

        let mut past = new_goal(1);
        past.target_date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert!(create_goal(&db, &clock, past).await.is_err());

        let theirs = create_test_saving(&db, 2, dec!(10), Frequency::Monthly).await?;
        let mut foreign = new_goal(1);
        foreign.saving_id = Some(theirs.id);
        assert!(matches!(
            create_goal(&db, &clock, foreign).await,
            Err(Error::NotFound { entity: "saving", .. })
        ));

        // Other owners cannot act on the goal
        let goal = create_goal(&db, &clock, new_goal(1)).await?;
        assert!(matches!(
            accept_goal(&db, &clock, 2, goal.id).await,
            Err(Error::NotFound { .. })
        ));

        Ok(())
    }

    struct CannedGenerator {
        proposal: GoalProposal,
        seen: Mutex<Option<serde_json::Value>>,
    }

    #[async_trait]
    impl ProposalGenerator for CannedGenerator {
        async fn propose(&self, snapshot: &serde_json::Value) -> Result<GoalProposal> {
            *self.seen.lock().unwrap() = Some(snapshot.clone());
            Ok(self.proposal.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ProposalGenerator for FailingGenerator {
        async fn propose(&self, _snapshot: &serde_json::Value) -> Result<GoalProposal> {
            Err(Error::Config {
                message: "model unavailable".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_propose_goal_persists_pending_goal() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 1);
        let account = create_test_account(&db, 1, "Checking").await?;
        let salary = create_test_income(&db, 1, dec!(3000), Frequency::Monthly).await?;
        create_test_recurrence(&db, &clock, 1, account.id, ItemRef::Income(salary.id)).await?;

        let generator = CannedGenerator {
            proposal: GoalProposal {
                name: "Holiday".to_string(),
                description: "You have room for a summer trip.".to_string(),
                goal_type: GoalType::Purchase,
                target_amount: dec!(1200),
                target_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            },
            seen: Mutex::new(None),
        };

        let (goal, notification) =
            propose_goal(&db, &clock, &generator, 1, "user@example.com").await?;
        assert_eq!(goal.status, GoalStatus::GoalPending);
        assert_eq!(goal.description.as_deref(), Some("You have room for a summer trip."));
        assert_eq!(notification.recipient, "user@example.com");
        assert!(notification.title.contains("Holiday"));

        let snapshot = generator.seen.lock().unwrap().clone().unwrap();
        assert_eq!(snapshot["recurrences"].as_array().unwrap().len(), 1);
        assert_eq!(snapshot["recurrences"][0]["kind"], "INCOME");
        assert!(snapshot["balances"].get("recurrent_income").is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_propose_goal_wraps_generator_errors() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 1);

        let result = propose_goal(&db, &clock, &FailingGenerator, 1, "user@example.com").await;
        assert!(matches!(result, Err(Error::Proposal { .. })));
        assert_eq!(goals_progress_by_status(&db, 1).await?.values().sum::<u64>(), 0);

        Ok(())
    }
}
