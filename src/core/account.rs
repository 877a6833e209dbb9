//! Account business logic - Handles account creation, lookup and the running balance.
//!
//! Account names are unique per owner among active accounts. Every lookup that
//! takes an `owner_id` treats accounts of other owners exactly like missing ones.

use crate::{
    clock::Clock,
    entities::{Account, AccountType, account},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info};

/// Creates a new account with a zero balance.
///
/// Making the account the default clears the flag on the owner's other accounts.
pub async fn create_account(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    name: String,
    account_type: AccountType,
    is_default: bool,
) -> Result<account::Model> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("name", "Account name cannot be empty"));
    }

    let txn = db.begin().await?;

    let duplicate = Account::find()
        .filter(account::Column::OwnerId.eq(owner_id))
        .filter(account::Column::Name.eq(name.as_str()))
        .filter(account::Column::IsDeleted.eq(false))
        .one(&txn)
        .await?;
    if duplicate.is_some() {
        return Err(Error::validation(
            "name",
            format!("An account named '{name}' already exists"),
        ));
    }

    if is_default {
        clear_default_flag(&txn, owner_id).await?;
    }

    let model = account::ActiveModel {
        owner_id: Set(owner_id),
        name: Set(name),
        account_type: Set(account_type),
        balance: Set(Decimal::ZERO),
        is_default: Set(is_default),
        created_at: Set(clock.now()),
        is_deleted: Set(false),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(account_id = model.id, owner_id, "Created account");
    Ok(model)
}

async fn clear_default_flag<C>(db: &C, owner_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    Account::update_many()
        .col_expr(account::Column::IsDefault, Expr::value(false))
        .filter(account::Column::OwnerId.eq(owner_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Finds an active account belonging to `owner_id`.
///
/// # Errors
/// Returns [`Error::NotFound`] if the account is missing, deleted or owned by someone else.
pub async fn get_account_for_owner<C>(
    db: &C,
    owner_id: i64,
    account_id: i64,
) -> Result<account::Model>
where
    C: ConnectionTrait,
{
    Account::find_by_id(account_id)
        .one(db)
        .await?
        .filter(|a| a.owner_id == owner_id && !a.is_deleted)
        .ok_or_else(|| Error::not_found("account", account_id))
}

/// Lists an owner's active accounts, ordered by name.
pub async fn list_accounts(db: &DatabaseConnection, owner_id: i64) -> Result<Vec<account::Model>> {
    Account::find()
        .filter(account::Column::OwnerId.eq(owner_id))
        .filter(account::Column::IsDeleted.eq(false))
        .order_by_asc(account::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns the owner's default account, if one is flagged.
pub async fn get_default_account(
    db: &DatabaseConnection,
    owner_id: i64,
) -> Result<Option<account::Model>> {
    Account::find()
        .filter(account::Column::OwnerId.eq(owner_id))
        .filter(account::Column::IsDefault.eq(true))
        .filter(account::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Soft-deletes an account. Its transactions and recurrences are kept; recurrences
/// on a deleted account are no longer selected by scheduled passes.
pub async fn soft_delete_account(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    account_id: i64,
) -> Result<account::Model> {
    let existing = get_account_for_owner(db, owner_id, account_id).await?;

    let mut active_model: account::ActiveModel = existing.into();
    active_model.is_deleted = Set(true);
    active_model.is_default = Set(false);
    active_model.deleted_at = Set(Some(clock.now()));
    let updated = active_model.update(db).await?;

    info!(account_id, owner_id, "Soft-deleted account");
    Ok(updated)
}

/// Adds `amount_delta` to the account balance in a single statement:
/// `UPDATE accounts SET balance = balance + ? WHERE id = ?`
///
/// Runs on whatever connection or transaction it is given so callers can pair it
/// with the insert of the transaction that caused it.
pub async fn adjust_balance<C>(db: &C, account_id: i64, amount_delta: Decimal) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Account::update_many()
        .col_expr(
            account::Column::Balance,
            Expr::col(account::Column::Balance).add(amount_delta),
        )
        .filter(account::Column::Id.eq(account_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("account", account_id));
    }
    debug!(account_id, %amount_delta, "Adjusted account balance");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_account_rejects_blank_name() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let clock = clock_at(2024, 3, 10);

        let result =
            create_account(&db, &clock, 1, "   ".to_string(), AccountType::Personal, false).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { field, .. } if field == "name"
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_account_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 10);

        let account =
            create_account(&db, &clock, 1, " Checking ".to_string(), AccountType::Personal, true)
                .await?;

        assert_eq!(account.name, "Checking");
        assert_eq!(account.balance, Decimal::ZERO);
        assert!(account.is_default);
        assert!(!account.is_deleted);
        assert_eq!(account.created_at, clock.now());

        Ok(())
    }

    #[tokio::test]
    async fn test_account_name_unique_per_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 10);
        create_test_account(&db, 1, "Checking").await?;

        let duplicate =
            create_account(&db, &clock, 1, "Checking".to_string(), AccountType::Shared, false).await;
        assert!(matches!(duplicate, Err(Error::Validation { .. })));

        // Another owner may reuse the name
        let other =
            create_account(&db, &clock, 2, "Checking".to_string(), AccountType::Personal, false)
                .await?;
        assert_eq!(other.owner_id, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_name_is_reusable_after_soft_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 10);
        let account = create_test_account(&db, 1, "Checking").await?;
        soft_delete_account(&db, &clock, 1, account.id).await?;

        let again =
            create_account(&db, &clock, 1, "Checking".to_string(), AccountType::Personal, false)
                .await?;
        assert_ne!(again.id, account.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_new_default_replaces_old_default() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 10);
        let first =
            create_account(&db, &clock, 1, "First".to_string(), AccountType::Personal, true).await?;
        let second =
            create_account(&db, &clock, 1, "Second".to_string(), AccountType::Personal, true).await?;

        let default = get_default_account(&db, 1).await?.unwrap();
        assert_eq!(default.id, second.id);
        let first = Account::find_by_id(first.id).one(&db).await?.unwrap();
        assert!(!first.is_default);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_account_for_other_owner_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, 1, "Checking").await?;

        let result = get_account_for_owner(&db, 2, account.id).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "account", .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_soft_deleted_account_hidden() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 10);
        let account = create_test_account(&db, 1, "Checking").await?;
        create_test_account(&db, 1, "Savings").await?;

        let deleted = soft_delete_account(&db, &clock, 1, account.id).await?;
        assert!(deleted.is_deleted);
        assert_eq!(deleted.deleted_at, Some(clock.now()));

        let remaining = list_accounts(&db, 1).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Savings");
        assert!(get_account_for_owner(&db, 1, account.id).await.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_balance_is_cumulative() -> Result<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, 1, "Checking").await?;

        adjust_balance(&db, account.id, dec!(100.5)).await?;
        adjust_balance(&db, account.id, dec!(-40.25)).await?;

        let updated = Account::find_by_id(account.id).one(&db).await?.unwrap();
        assert_eq!(updated.balance, dec!(60.25));

        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_balance_missing_account() -> Result<()> {
        let db = setup_test_db().await?;
        let result = adjust_balance(&db, 999, dec!(10)).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }
}
