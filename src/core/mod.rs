//! Core business logic - Framework-agnostic operations on the finance data.
//!
//! Interactive operations validate input and return [`crate::errors::Error::Validation`]
//! or [`crate::errors::Error::NotFound`] to the caller. Scheduled work goes through
//! [`pass::run_pass`], which books due recurrences via the allocation resolvers
//! and the materializer.

pub mod account;
pub mod allocation;
pub mod balance;
pub mod catalog;
pub mod goal;
pub mod item;
pub mod materialize;
pub mod pass;
pub mod recurrence;
pub mod report;
pub mod run_ledger;
pub mod transaction;
