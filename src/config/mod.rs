//! Application configuration.
//!
//! Settings come from two places: environment variables (optionally loaded from
//! `.env` by `dotenvy` in `main`) and a `config.toml` file for the scheduler's job table.

/// Database configuration and connection management
pub mod database;

/// Scheduler job table loading from config.toml
pub mod schedule;

pub use schedule::{AppConfig, JobConfig, SchedulerConfig, load_app_configuration, load_config};
