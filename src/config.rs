use anyhow::{bail, Context, Result};
use chrono::TimeDelta;
use std::collections::HashMap;
use std::env;
use tracing::warn;

use crate::days::ApplicableDays;
use crate::error::Field;
use crate::period::{parse_location, parse_offset, FloatingPeriod};

#[derive(Debug, Clone)]
pub struct Config {
    // Window bounds as entered, e.g. "22:00"
    pub period_start: String,
    pub period_end: String,

    // Applicable days, e.g. "mon-fri" or "weekends,wed"
    pub period_days: String,

    // IANA timezone the offsets are measured in
    pub period_tz: String,

    /// Name used in log lines and reports
    pub label: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env if present, ignore if missing
        Self::from_getter(|key| env::var(key).ok())
    }

    /// Parse config from a custom getter function (for testing)
    pub fn from_getter<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            period_start: get("PERIOD_START").context("PERIOD_START not set")?,
            period_end: get("PERIOD_END").context("PERIOD_END not set")?,

            period_days: get("PERIOD_DAYS")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "all".to_string()),

            period_tz: get("PERIOD_TZ")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "UTC".to_string()),

            label: get("PERIOD_LABEL").unwrap_or_else(|| "period".to_string()),
        })
    }

    /// Create config from a HashMap (convenience for testing)
    #[cfg(test)]
    pub fn from_map(map: &HashMap<&str, &str>) -> Result<Self> {
        Self::from_getter(|key| map.get(key).map(|v| v.to_string()))
    }

    /// Build the configured floating period
    pub fn period(&self) -> Result<FloatingPeriod> {
        let start = parse_offset(Field::Start, &self.period_start).context("PERIOD_START")?;
        let end = parse_offset(Field::End, &self.period_end).context("PERIOD_END")?;
        let days: ApplicableDays = self.period_days.parse().context("PERIOD_DAYS")?;
        FloatingPeriod::new(start, end, days, &self.period_tz).context("PERIOD_TZ")
    }

    /// Validate configuration values at startup.
    /// Returns Ok(()) if all validations pass, or Err with details of what failed.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        let start = parse_offset(Field::Start, &self.period_start);
        if let Err(e) = &start {
            errors.push(format!("PERIOD_START: {}", e));
        }

        let end = parse_offset(Field::End, &self.period_end);
        if let Err(e) = &end {
            errors.push(format!("PERIOD_END: {}", e));
        }

        if let Err(e) = self.period_days.parse::<ApplicableDays>() {
            errors.push(format!("PERIOD_DAYS: {}", e));
        }

        if let Err(e) = parse_location(&self.period_tz) {
            errors.push(format!("PERIOD_TZ: {}", e));
        }

        if self.label.trim().is_empty() {
            errors.push("PERIOD_LABEL cannot be empty.".to_string());
        }

        if let (Ok(start), Ok(end)) = (start, end) {
            if start == end && start != TimeDelta::zero() {
                // Equal offsets mean whole days, whatever the time given
                warn!(
                    "PERIOD_START equals PERIOD_END ({}); the period covers whole days",
                    self.period_start
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any well-formed HH:MM pair validates and builds
        #[test]
        fn valid_offsets_build(sh in 0u32..24, sm in 0u32..60, eh in 0u32..24, em in 0u32..60) {
            let start = format!("{:02}:{:02}", sh, sm);
            let end = format!("{:02}:{:02}", eh, em);
            let config = Config::from_getter(|key| match key {
                "PERIOD_START" => Some(start.clone()),
                "PERIOD_END" => Some(end.clone()),
                _ => None,
            })
            .unwrap();
            prop_assert!(config.validate().is_ok());
            prop_assert!(config.period().is_ok());
        }

        /// validate and period never panic, whatever the input
        #[test]
        fn arbitrary_input_never_panics(start in ".*", end in ".*", days in ".*", tz in ".*") {
            let config = Config::from_getter(|key| match key {
                "PERIOD_START" => Some(start.clone()),
                "PERIOD_END" => Some(end.clone()),
                "PERIOD_DAYS" => Some(days.clone()),
                "PERIOD_TZ" => Some(tz.clone()),
                _ => None,
            })
            .unwrap();
            let _ = config.validate();
            let _ = config.period();
        }
    }
}
