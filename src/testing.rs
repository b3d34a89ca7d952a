//! Helpers for building periods inside tests
//!
//! The failure path is injected through [`Fatal`] rather than reaching for
//! a global test runner, so callers decide how a construction error halts
//! the test.

use chrono::TimeDelta;
use std::fmt::Display;

use crate::days::ApplicableDays;
use crate::period::FloatingPeriod;

/// Capability that fails the current test and stops it
pub trait Fatal {
    fn fatal(&self, message: &str) -> !;
}

/// Fails the test by panicking, which is what `#[test]` expects
#[derive(Debug, Clone, Copy, Default)]
pub struct Panicking;

impl Fatal for Panicking {
    fn fatal(&self, message: &str) -> ! {
        panic!("{}", message)
    }
}

/// Unwrap `result`, failing the test with `message` and the error otherwise
pub fn require_ok<F, T, E>(t: &F, result: Result<T, E>, message: &str) -> T
where
    F: Fatal + ?Sized,
    E: Display,
{
    match result {
        Ok(value) => value,
        Err(err) => t.fatal(&format!("{}: {}", message, err)),
    }
}

/// Build a period for a test scenario, failing the test if it is invalid
pub fn must_floating_period<F>(
    t: &F,
    start: TimeDelta,
    end: TimeDelta,
    days: ApplicableDays,
    location: &str,
) -> FloatingPeriod
where
    F: Fatal + ?Sized,
{
    require_ok(
        t,
        FloatingPeriod::new(start, end, days, location),
        "failed to create floating period",
    )
}
