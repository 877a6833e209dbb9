//! Scheduler configuration loading from config.toml
//!
//! The five calendar timers are configuration data rather than code. A missing
//! file or a missing `[scheduler]` table yields [`SchedulerConfig::default`], whose
//! job table is: daily, weekly (Monday), monthly (1st), annual (January 1st) and
//! biweekly (1st and 15th), all at midnight UTC.

use crate::{
    entities::Frequency,
    errors::{Error, Result},
    scheduler::CalendarRule,
};
use chrono::{NaiveTime, Weekday};
use serde::Deserialize;
use std::{collections::HashSet, path::Path};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "FINTRACK_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Settings for timers, the pass queue and its workers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of passes running at the same time
    pub worker_limit: usize,
    /// Capacity of the queue between timers and workers
    pub queue_capacity: usize,
    /// Skip a pass whose (frequency, period) already has a run recorded
    pub skip_completed_periods: bool,
    /// Registered jobs
    pub jobs: Vec<JobConfig>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_limit: 4,
            queue_capacity: 64,
            skip_completed_periods: true,
            jobs: default_jobs(),
        }
    }
}

/// Configuration for a single scheduled job
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Name used in logs
    pub name: String,
    /// Frequency processed when the job fires
    pub frequency: Frequency,
    /// When the job fires
    pub rule: CalendarRule,
    /// Time of day (UTC) the job fires at
    #[serde(default = "midnight")]
    pub at: NaiveTime,
    /// Disabled jobs are kept in the table but never armed
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

const fn enabled_by_default() -> bool {
    true
}

const fn midnight() -> NaiveTime {
    NaiveTime::MIN
}

fn job(name: &str, frequency: Frequency, rule: CalendarRule) -> JobConfig {
    JobConfig {
        name: name.to_string(),
        frequency,
        rule,
        at: midnight(),
        enabled: true,
    }
}

/// The built-in job table.
#[must_use]
pub fn default_jobs() -> Vec<JobConfig> {
    vec![
        job("daily", Frequency::Daily, CalendarRule::Day),
        job(
            "weekly",
            Frequency::Weekly,
            CalendarRule::Week {
                weekday: Weekday::Mon,
            },
        ),
        job("monthly", Frequency::Monthly, CalendarRule::Month { days: vec![1] }),
        job("annual", Frequency::Annual, CalendarRule::Year { month: 1, day: 1 }),
        job(
            "biweekly",
            Frequency::Biweekly,
            CalendarRule::Month { days: vec![1, 15] },
        ),
    ]
}

impl SchedulerConfig {
    /// Checks limits, job names and calendar rules.
    ///
    /// # Errors
    /// Returns [`Error::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.worker_limit == 0 {
            return Err(Error::Config {
                message: "scheduler.worker_limit must be at least 1".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(Error::Config {
                message: "scheduler.queue_capacity must be at least 1".to_string(),
            });
        }

        let mut names = HashSet::new();
        for job in &self.jobs {
            if !names.insert(job.name.as_str()) {
                return Err(Error::Config {
                    message: format!("duplicate job name `{}`", job.name),
                });
            }
            job.rule.validate().map_err(|reason| Error::Config {
                message: format!("job `{}`: {reason}", job.name),
            })?;
        }
        Ok(())
    }
}

/// Loads and validates configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML is invalid, or
/// validation fails.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.scheduler.validate()?;
    Ok(config)
}

/// Loads the configuration named by `FINTRACK_CONFIG` (default `./config.toml`).
///
/// A missing file is not an error; the built-in defaults are used instead.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if Path::new(&path).exists() {
        let config = load_config(&path)?;
        tracing::info!("Loaded configuration from {path}");
        Ok(config)
    } else {
        tracing::info!("No configuration file at {path}, using built-in defaults");
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_default_table_has_five_jobs() {
        let config = SchedulerConfig::default();
        assert_eq!(config.jobs.len(), 5);
        assert!(config.validate().is_ok());
        let frequencies: Vec<_> = config.jobs.iter().map(|j| j.frequency).collect();
        assert_eq!(
            frequencies,
            vec![
                Frequency::Daily,
                Frequency::Weekly,
                Frequency::Monthly,
                Frequency::Annual,
                Frequency::Biweekly
            ]
        );
    }

    #[test]
    fn test_parse_scheduler_config() {
        let toml_str = r#"
            [scheduler]
            worker_limit = 2
            skip_completed_periods = false

            [[scheduler.jobs]]
            name = "monthly"
            frequency = "MONTHLY"
            rule = { every = "month", days = [1] }

            [[scheduler.jobs]]
            name = "weekly"
            frequency = "WEEKLY"
            rule = { every = "week", weekday = "Mon" }
            at = "06:30:00"
            enabled = false
        "#;

        let config = parse_config(toml_str).unwrap();
        let scheduler = config.scheduler;
        assert_eq!(scheduler.worker_limit, 2);
        assert_eq!(scheduler.queue_capacity, 64);
        assert!(!scheduler.skip_completed_periods);
        assert_eq!(scheduler.jobs.len(), 2);
        assert_eq!(scheduler.jobs[0].frequency, Frequency::Monthly);
        assert_eq!(scheduler.jobs[0].at, NaiveTime::MIN);
        assert!(scheduler.jobs[0].enabled);
        assert_eq!(
            scheduler.jobs[1].at,
            NaiveTime::from_hms_opt(6, 30, 0).unwrap()
        );
        assert!(!scheduler.jobs[1].enabled);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml")).unwrap();
        let defaults = SchedulerConfig::default();
        assert_eq!(config.scheduler.jobs.len(), defaults.jobs.len());
        for (shipped, default) in config.scheduler.jobs.iter().zip(&defaults.jobs) {
            assert_eq!(shipped.name, default.name);
            assert_eq!(shipped.frequency, default.frequency);
            assert_eq!(shipped.rule, default.rule);
            assert_eq!(shipped.at, default.at);
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(matches!(
            load_config("does/not/exist.toml"),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.scheduler.jobs.len(), 5);
        assert_eq!(config.scheduler.worker_limit, 4);
    }

    #[test]
    fn test_duplicate_job_names_rejected() {
        let toml_str = r#"
            [[scheduler.jobs]]
            name = "monthly"
            frequency = "MONTHLY"
            rule = { every = "month", days = [1] }

            [[scheduler.jobs]]
            name = "monthly"
            frequency = "ANNUAL"
            rule = { every = "year", month = 1, day = 1 }
        "#;
        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_invalid_rule_rejected() {
        let toml_str = r#"
            [[scheduler.jobs]]
            name = "broken"
            frequency = "MONTHLY"
            rule = { every = "month", days = [40] }
        "#;
        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_zero_worker_limit_rejected() {
        let toml_str = r"
            [scheduler]
            worker_limit = 0
        ";
        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }
}
