//! Categories and taxes referenced by incomes, expenses and savings.

use crate::{
    clock::Clock,
    entities::{Category, Tax, category, tax},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Name given in reports to expenses without a usable category.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Creates an expense category.
pub async fn create_category(
    db: &DatabaseConnection,
    owner_id: i64,
    name: String,
) -> Result<category::Model> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("name", "Category name cannot be empty"));
    }
    if name.eq_ignore_ascii_case(UNCATEGORIZED) {
        return Err(Error::validation(
            "name",
            format!("'{UNCATEGORIZED}' is reserved"),
        ));
    }

    category::ActiveModel {
        owner_id: Set(owner_id),
        name: Set(name),
        is_deleted: Set(false),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Finds an active category belonging to `owner_id`.
pub async fn get_category_for_owner<C>(
    db: &C,
    owner_id: i64,
    category_id: i64,
) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    Category::find_by_id(category_id)
        .one(db)
        .await?
        .filter(|c| c.owner_id == owner_id && !c.is_deleted)
        .ok_or_else(|| Error::not_found("category", category_id))
}

/// Lists an owner's active categories, ordered by name.
pub async fn list_categories(
    db: &DatabaseConnection,
    owner_id: i64,
) -> Result<Vec<category::Model>> {
    Category::find()
        .filter(category::Column::OwnerId.eq(owner_id))
        .filter(category::Column::IsDeleted.eq(false))
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Soft-deletes a category. Expenses keep pointing at it and are reported as uncategorized.
pub async fn soft_delete_category(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    category_id: i64,
) -> Result<category::Model> {
    let existing = get_category_for_owner(db, owner_id, category_id).await?;
    let mut active_model: category::ActiveModel = existing.into();
    active_model.is_deleted = Set(true);
    active_model.deleted_at = Set(Some(clock.now()));
    active_model.update(db).await.map_err(Into::into)
}

/// Creates a tax with a rate expressed as a fraction in `[0, 1]`.
pub async fn create_tax(
    db: &DatabaseConnection,
    owner_id: i64,
    name: String,
    rate: Decimal,
) -> Result<tax::Model> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("name", "Tax name cannot be empty"));
    }
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(Error::validation("rate", format!("{rate} is outside [0, 1]")));
    }

    tax::ActiveModel {
        owner_id: Set(owner_id),
        name: Set(name),
        rate: Set(rate),
        is_deleted: Set(false),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Finds an active tax belonging to `owner_id`.
pub async fn get_tax_for_owner<C>(db: &C, owner_id: i64, tax_id: i64) -> Result<tax::Model>
where
    C: ConnectionTrait,
{
    Tax::find_by_id(tax_id)
        .one(db)
        .await?
        .filter(|t| t.owner_id == owner_id && !t.is_deleted)
        .ok_or_else(|| Error::not_found("tax", tax_id))
}

/// Soft-deletes a tax.
pub async fn soft_delete_tax(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    owner_id: i64,
    tax_id: i64,
) -> Result<tax::Model> {
    let existing = get_tax_for_owner(db, owner_id, tax_id).await?;
    let mut active_model: tax::ActiveModel = existing.into();
    active_model.is_deleted = Set(true);
    active_model.deleted_at = Set(Some(clock.now()));
    active_model.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_create_and_list_categories() -> Result<()> {
        let db = setup_test_db().await?;
        create_category(&db, 1, "Rent".to_string()).await?;
        create_category(&db, 1, "Food".to_string()).await?;
        create_category(&db, 2, "Travel".to_string()).await?;

        let names: Vec<String> = list_categories(&db, 1)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Food", "Rent"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_uncategorized_is_reserved() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_category(&db, 1, "Uncategorized".to_string()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_category_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = clock_at(2024, 3, 10);
        let food = create_category(&db, 1, "Food".to_string()).await?;
        soft_delete_category(&db, &clock, 1, food.id).await?;

        let result = get_category_for_owner(&db, 1, food.id).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "category", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_tax_rate_validated() -> Result<()> {
        let db = setup_test_db().await?;
        let too_high = create_tax(&db, 1, "Bad".to_string(), dec!(1.5)).await;
        assert!(matches!(too_high, Err(Error::Validation { .. })));
        let negative = create_tax(&db, 1, "Bad".to_string(), dec!(-0.1)).await;
        assert!(matches!(negative, Err(Error::Validation { .. })));

        let tax = create_tax(&db, 1, "Income tax".to_string(), dec!(0.25)).await?;
        assert_eq!(get_tax_for_owner(&db, 1, tax.id).await?.rate, dec!(0.25));
        assert!(get_tax_for_owner(&db, 2, tax.id).await.is_err());
        Ok(())
    }
}
