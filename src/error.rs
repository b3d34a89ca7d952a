//! Validation errors raised while building a floating period

use chrono::TimeDelta;
use std::fmt;
use thiserror::Error;

/// Which construction input was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Start,
    End,
    Days,
    Location,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Start => "start offset",
            Field::End => "end offset",
            Field::Days => "applicable days",
            Field::Location => "location",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} {} is outside 00:00..24:00", format_offset(.offset))]
    OffsetOutOfRange { field: Field, offset: TimeDelta },

    #[error("{field} '{input}' is not a time of day (expected HH:MM or HH:MM:SS)")]
    MalformedOffset { field: Field, input: String },

    #[error("applicable days must not be empty")]
    EmptyDays,

    #[error("unknown weekday '{0}'")]
    UnknownWeekday(String),

    #[error("location '{0}' is not a known timezone")]
    InvalidLocation(String),
}

impl ValidationError {
    /// The input that failed validation
    pub fn field(&self) -> Field {
        match self {
            ValidationError::OffsetOutOfRange { field, .. }
            | ValidationError::MalformedOffset { field, .. } => *field,
            ValidationError::EmptyDays | ValidationError::UnknownWeekday(_) => Field::Days,
            ValidationError::InvalidLocation(_) => Field::Location,
        }
    }
}

/// Render an offset as `[-]HH:MM:SS`, whole seconds only
pub(crate) fn format_offset(offset: &TimeDelta) -> String {
    let secs = offset.num_seconds();
    let sign = if secs < 0 { "-" } else { "" };
    let secs = secs.unsigned_abs();
    format!(
        "{}{:02}:{:02}:{:02}",
        sign,
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}
