//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod category;
pub mod enums;
pub mod expense;
pub mod goal;
pub mod income;
pub mod income_allocation;
pub mod job_run;
pub mod recurrence;
pub mod saving;
pub mod saving_allocation;
pub mod tax;
pub mod transaction;

pub use account::{Column as AccountColumn, Entity as Account, Model as AccountModel};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use enums::{AccountType, Frequency, GoalStatus, GoalType, ItemKind, SourceKind, TransactionType};
pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
pub use goal::{Column as GoalColumn, Entity as Goal, Model as GoalModel};
pub use income::{Column as IncomeColumn, Entity as Income, Model as IncomeModel};
pub use income_allocation::{
    Column as IncomeAllocationColumn, Entity as IncomeAllocation, Model as IncomeAllocationModel,
};
pub use job_run::{Column as JobRunColumn, Entity as JobRun, Model as JobRunModel};
pub use recurrence::{
    Column as RecurrenceColumn, Entity as Recurrence, ItemRef, Model as RecurrenceModel,
};
pub use saving::{Column as SavingColumn, Entity as Saving, Model as SavingModel};
pub use saving_allocation::{
    Column as SavingAllocationColumn, Entity as SavingAllocation, Model as SavingAllocationModel,
};
pub use tax::{Column as TaxColumn, Entity as Tax, Model as TaxModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel, Source,
};
