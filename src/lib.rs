//! floatperiod library - recurring time windows in civil timezones
//!
//! This module exports the period model plus the config, scheduler and CLI
//! pieces used by the binary.

pub mod cli;
pub mod config;
pub mod days;
pub mod error;
pub mod period;
pub mod scheduler;
pub mod testing;

pub use days::ApplicableDays;
pub use error::{Field, ValidationError};
pub use period::{FloatingPeriod, Window};
