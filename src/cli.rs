//! Command-line argument parsing and query reports for floatperiod

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::period::FloatingPeriod;

/// Parse command line arguments
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Args {
    /// Instant to query, RFC3339
    pub at: Option<String>,
    pub now: bool,
    pub json: bool,
    pub validate: bool,
    pub watch: bool,
    pub help: bool,
}

pub fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    parse_args_from(&args)
}

/// Testable version: parse from an explicit argv (program name first)
pub fn parse_args_from(args: &[String]) -> Args {
    let mut result = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--at" => {
                if i + 1 < args.len() {
                    i += 1;
                    result.at = Some(args[i].clone());
                }
            }
            "--now" => result.now = true,
            "--json" => result.json = true,
            "--validate" => result.validate = true,
            "--watch" => result.watch = true,
            "--help" | "-h" => result.help = true,
            _ => {}
        }
        i += 1;
    }

    result
}

pub fn print_help() {
    println!("floatperiod - recurring time window checker\n");
    println!("USAGE:");
    println!("    floatperiod [OPTIONS]\n");
    println!("OPTIONS:");
    println!("    --at <RFC3339>      Check whether an instant falls inside the period");
    println!("    --now               Check the current instant");
    println!("    --json              Print the check result as JSON");
    println!("    --validate          Validate configuration and exit");
    println!("    --watch             Log each window as it opens until interrupted");
    println!("    --help, -h          Show this help message\n");
    println!("ENVIRONMENT:");
    println!("    PERIOD_START, PERIOD_END   Offsets from local midnight (HH:MM[:SS])");
    println!("    PERIOD_DAYS                Applicable days, e.g. mon-fri (default: all)");
    println!("    PERIOD_TZ                  IANA timezone (default: UTC)");
    println!("    PERIOD_LABEL               Name used in logs (default: period)");
}

/// Parse an RFC3339 instant such as `2024-01-03T12:00:00Z`
pub fn parse_instant(input: &str) -> anyhow::Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(input.trim())
        .map_err(|e| anyhow::anyhow!("invalid instant '{}': {}", input, e))
}

/// Result of checking one instant against a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub label: String,
    pub period: String,
    pub instant: String,
    pub contained: bool,
    pub window_start: Option<String>,
    pub window_end: Option<String>,
    pub next_start: Option<String>,
}

impl Report {
    pub fn build(period: &FloatingPeriod, label: &str, instant: DateTime<Utc>) -> Self {
        let window = period.window_at(&instant);
        let next = match window {
            Some(_) => None,
            None => period.next_window(&instant),
        };

        Report {
            label: label.to_string(),
            period: period.to_string(),
            instant: instant.to_rfc3339(),
            contained: period.contains(&instant),
            window_start: window.map(|w| w.start.to_rfc3339()),
            window_end: window.map(|w| w.end.to_rfc3339()),
            next_start: next.map(|w| w.start.to_rfc3339()),
        }
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        match (&self.window_start, &self.window_end, &self.next_start) {
            (Some(start), Some(end), _) => format!(
                "{}: {} is INSIDE {} ({} .. {})",
                self.label, self.instant, self.period, start, end
            ),
            _ if self.contained => {
                format!("{}: {} is INSIDE {}", self.label, self.instant, self.period)
            }
            (_, _, Some(next)) => format!(
                "{}: {} is outside {}; next window opens {}",
                self.label, self.instant, self.period, next
            ),
            _ => format!("{}: {} is outside {}", self.label, self.instant, self.period),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::days::ApplicableDays;
    use chrono::{TimeDelta, TimeZone, Weekday};

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("floatperiod")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    fn wednesday_hours() -> FloatingPeriod {
        FloatingPeriod::new(
            TimeDelta::hours(9),
            TimeDelta::hours(17),
            ApplicableDays::new([Weekday::Wed]),
            "UTC",
        )
        .unwrap()
    }

    #[test]
    fn test_parse_args_default() {
        let result = parse_args_from(&argv(&[]));
        assert_eq!(result, Args::default());
    }

    #[test]
    fn test_parse_args_at() {
        let result = parse_args_from(&argv(&["--at", "2024-01-03T12:00:00Z"]));
        assert_eq!(result.at.as_deref(), Some("2024-01-03T12:00:00Z"));
        assert!(!result.watch);
    }

    #[test]
    fn test_parse_args_at_without_value() {
        let result = parse_args_from(&argv(&["--at"]));
        assert!(result.at.is_none());
    }

    #[test]
    fn test_parse_args_help() {
        assert!(parse_args_from(&argv(&["--help"])).help);
        assert!(parse_args_from(&argv(&["-h"])).help);
    }

    #[test]
    fn test_parse_args_multiple_flags() {
        let result = parse_args_from(&argv(&["--now", "--json", "--validate", "--watch", "--bogus"]));
        assert!(result.now);
        assert!(result.json);
        assert!(result.validate);
        assert!(result.watch);
        assert!(!result.help);
    }

    #[test]
    fn test_parse_instant() {
        let t = parse_instant("2024-01-03T07:00:00-05:00").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap());
        assert!(parse_instant("yesterday").is_err());
    }

    #[test]
    fn test_report_inside() {
        let t = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        let report = Report::build(&wednesday_hours(), "office", t);
        assert!(report.contained);
        assert_eq!(report.window_start.as_deref(), Some("2024-01-03T09:00:00+00:00"));
        assert_eq!(report.window_end.as_deref(), Some("2024-01-03T17:00:00+00:00"));
        assert!(report.next_start.is_none());
        assert!(report.summary().contains("INSIDE"), "{}", report.summary());
    }

    #[test]
    fn test_report_outside() {
        let t = Utc.with_ymd_and_hms(2024, 1, 4, 12, 0, 0).unwrap();
        let report = Report::build(&wednesday_hours(), "office", t);
        assert!(!report.contained);
        assert!(report.window_start.is_none());
        assert_eq!(report.next_start.as_deref(), Some("2024-01-10T09:00:00+00:00"));
        assert!(report.summary().contains("next window opens"), "{}", report.summary());
    }

    #[test]
    fn test_report_json_shape() {
        let t = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        let report = Report::build(&wednesday_hours(), "office", t);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["label"], "office");
        assert_eq!(value["contained"], true);
        assert_eq!(value["period"], "09:00:00-17:00:00 on wed (UTC)");
        assert!(value["next_start"].is_null());
    }

    #[test]
    fn test_report_at_calendar_edge() {
        let overnight = FloatingPeriod::new(
            TimeDelta::hours(22),
            TimeDelta::hours(2),
            ApplicableDays::all(),
            "UTC",
        )
        .unwrap();
        let report = Report::build(&overnight, "night", DateTime::<Utc>::MAX_UTC);
        assert!(report.contained);
        assert!(report.window_start.is_none());
        assert!(report.next_start.is_none());
        assert!(report.summary().contains("is INSIDE"), "{}", report.summary());
    }
}
