//! Applicable-day sets
//!
//! A compact set of weekdays with a textual form used by configuration:
//! comma-separated day names, inclusive ranges (`mon-fri`, wrapping ranges
//! like `fri-mon` allowed) and the keywords `all`, `daily`, `weekdays`,
//! `weekends`.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

const ALL_BITS: u8 = 0b0111_1111;

/// Days of the week a period applies to
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApplicableDays(u8);

impl ApplicableDays {
    pub fn new<I>(days: I) -> Self
    where
        I: IntoIterator<Item = Weekday>,
    {
        let mut set = Self::default();
        for day in days {
            set.insert(day);
        }
        set
    }

    pub fn all() -> Self {
        Self(ALL_BITS)
    }

    /// Monday through Friday
    pub fn weekdays() -> Self {
        Self::new([
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ])
    }

    pub fn weekends() -> Self {
        Self::new([Weekday::Sat, Weekday::Sun])
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= bit(day);
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & bit(day) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Days in the set, Monday first
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.iter().copied().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Weekday> for ApplicableDays {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        Self::new(iter)
    }
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn bit(day: Weekday) -> u8 {
    1 << day.num_days_from_monday()
}

fn short_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

/// Parse a single day name: three-letter or full English name, any case
fn parse_day(name: &str) -> Result<Weekday, ValidationError> {
    let lower = name.trim().to_ascii_lowercase();
    let day = match lower.as_str() {
        "mon" | "monday" => Weekday::Mon,
        "tue" | "tues" | "tuesday" => Weekday::Tue,
        "wed" | "wednesday" => Weekday::Wed,
        "thu" | "thur" | "thurs" | "thursday" => Weekday::Thu,
        "fri" | "friday" => Weekday::Fri,
        "sat" | "saturday" => Weekday::Sat,
        "sun" | "sunday" => Weekday::Sun,
        _ => return Err(ValidationError::UnknownWeekday(name.trim().to_string())),
    };
    Ok(day)
}

impl FromStr for ApplicableDays {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = Self::default();

        for item in s.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }

            match item.to_ascii_lowercase().as_str() {
                "all" | "daily" => set.0 |= ALL_BITS,
                "weekdays" => set.0 |= Self::weekdays().0,
                "weekends" => set.0 |= Self::weekends().0,
                _ => {
                    if let Some((from, to)) = item.split_once('-') {
                        let from = parse_day(from)?;
                        let to = parse_day(to)?;
                        let mut day = from;
                        set.insert(day);
                        while day != to {
                            day = day.succ();
                            set.insert(day);
                        }
                    } else {
                        set.insert(parse_day(item)?);
                    }
                }
            }
        }

        if set.is_empty() {
            return Err(ValidationError::EmptyDays);
        }
        Ok(set)
    }
}

impl fmt::Display for ApplicableDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(short_name).collect();
        f.write_str(&names.join(","))
    }
}

impl fmt::Debug for ApplicableDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApplicableDays({})", self)
    }
}

impl TryFrom<String> for ApplicableDays {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ApplicableDays> for String {
    fn from(days: ApplicableDays) -> Self {
        days.to_string()
    }
}
