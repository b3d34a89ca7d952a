//! Floating periods: recurring daily windows in a civil timezone
//!
//! A period is a start and end offset from local midnight, a set of
//! applicable weekdays and a timezone. When the end offset is before the
//! start offset the window runs past midnight into the next civil day,
//! and that carried-over part belongs to the day the window started on.
//! Equal offsets cover the whole civil day.

use chrono::{
    DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike,
    Utc,
};
use chrono_tz::Tz;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::days::ApplicableDays;
use crate::error::{format_offset, Field, ValidationError};

/// Length of a civil day; offsets must be strictly below this
pub const DAY: TimeDelta = TimeDelta::seconds(24 * 3600);

/// How far `next_window` scans ahead before giving up
const LOOKAHEAD_DAYS: u64 = 8;

/// Shift applied when resolving a local time that falls in a DST gap
const GAP_PROBE: TimeDelta = TimeDelta::seconds(3 * 3600);

/// A recurring window of time in a specific timezone
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FloatingPeriod {
    start: TimeDelta,
    end: TimeDelta,
    days: ApplicableDays,
    location: Tz,
}

/// One concrete occurrence of a period, half-open `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl Window {
    pub fn contains<T: TimeZone>(&self, instant: &DateTime<T>) -> bool {
        let instant = instant.with_timezone(&Utc);
        self.start <= instant && instant < self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end.signed_duration_since(self.start)
    }
}

impl FloatingPeriod {
    /// Build a period, resolving `location` as an IANA timezone name.
    ///
    /// Inputs are checked in order (start, end, days, location) and the
    /// first failure is returned.
    pub fn new(
        start: TimeDelta,
        end: TimeDelta,
        days: ApplicableDays,
        location: &str,
    ) -> Result<Self, ValidationError> {
        check_inputs(start, end, days)?;
        let location = parse_location(location)?;
        Ok(Self::accepted(start, end, days, location))
    }

    /// Build a period from an already-resolved timezone
    pub fn with_tz(
        start: TimeDelta,
        end: TimeDelta,
        days: ApplicableDays,
        location: Tz,
    ) -> Result<Self, ValidationError> {
        check_inputs(start, end, days)?;
        Ok(Self::accepted(start, end, days, location))
    }

    fn accepted(start: TimeDelta, end: TimeDelta, days: ApplicableDays, location: Tz) -> Self {
        let period = Self {
            start,
            end,
            days,
            location,
        };
        debug!("Floating period accepted: {}", period);
        period
    }

    pub fn start(&self) -> TimeDelta {
        self.start
    }

    pub fn end(&self) -> TimeDelta {
        self.end
    }

    pub fn days(&self) -> ApplicableDays {
        self.days
    }

    pub fn location(&self) -> Tz {
        self.location
    }

    /// True when the window runs past local midnight
    pub fn wraps_midnight(&self) -> bool {
        self.end < self.start
    }

    /// True when start and end coincide, meaning the whole civil day
    pub fn is_full_day(&self) -> bool {
        self.start == self.end
    }

    /// Check whether `instant` falls inside any occurrence of the period.
    ///
    /// The Unix epoch (and `DateTime::<Utc>::default()`) is an ordinary
    /// instant: 1970-01-01 00:00 UTC, a Thursday.
    pub fn contains<T: TimeZone>(&self, instant: &DateTime<T>) -> bool {
        self.anchor_date(instant).is_some()
    }

    /// The occurrence containing `instant`, if any.
    ///
    /// Returns `Some` exactly when [`contains`](Self::contains) is true,
    /// except for an occurrence whose bounds fall past the last date chrono
    /// can represent.
    pub fn window_at<T: TimeZone>(&self, instant: &DateTime<T>) -> Option<Window> {
        let anchor = self.anchor_date(instant)?;
        self.window_anchored(anchor)
    }

    /// The occurrence that starts on civil date `date`, if that date's
    /// weekday is applicable
    pub fn window_on(&self, date: NaiveDate) -> Option<Window> {
        if self.days.contains(date.weekday()) {
            self.window_anchored(date)
        } else {
            None
        }
    }

    /// Successive occurrences anchored on `from` or later
    pub fn windows_from(&self, from: NaiveDate) -> Windows<'_> {
        Windows {
            period: self,
            next: Some(from),
        }
    }

    /// First occurrence whose start is at or after `after`
    pub fn next_window<T: TimeZone>(&self, after: &DateTime<T>) -> Option<Window> {
        let after = after.with_timezone(&Utc);
        let today = after.with_timezone(&self.location).date_naive();
        // Occurrences anchored before today always start before `after`
        let horizon = today.checked_add_days(Days::new(LOOKAHEAD_DAYS))?;
        self.windows_from(today)
            .take_while(|w| w.start.date_naive() <= horizon)
            .find(|w| w.start >= after)
    }

    /// How long to wait for the next occurrence to begin.
    ///
    /// `None` when `now` is already inside an occurrence.
    pub fn time_until_next<T: TimeZone>(&self, now: &DateTime<T>) -> Option<Duration> {
        if self.contains(now) {
            return None;
        }
        let now = now.with_timezone(&Utc);
        let next = self.next_window(&now)?;
        Some(
            next.start
                .signed_duration_since(now)
                .to_std()
                .unwrap_or(Duration::ZERO),
        )
    }

    /// Civil date the matching occurrence starts on
    fn anchor_date<T: TimeZone>(&self, instant: &DateTime<T>) -> Option<NaiveDate> {
        let local = instant.with_timezone(&self.location);
        let date = local.date_naive();
        let weekday = date.weekday();
        let tod = time_of_day(local.time());

        if self.is_full_day() {
            return self.days.contains(weekday).then_some(date);
        }

        if !self.wraps_midnight() {
            let inside = self.start <= tod && tod < self.end;
            return (inside && self.days.contains(weekday)).then_some(date);
        }

        if tod >= self.start && self.days.contains(weekday) {
            return Some(date);
        }
        if tod < self.end && self.days.contains(weekday.pred()) {
            return date.pred_opt();
        }
        None
    }

    /// None when a bound lies outside chrono's calendar
    fn window_anchored(&self, date: NaiveDate) -> Option<Window> {
        let midnight = date.and_time(NaiveTime::MIN);
        let end_offset = if self.is_full_day() {
            DAY
        } else if self.wraps_midnight() {
            DAY + self.end
        } else {
            self.end
        };
        let start = midnight.checked_add_signed(self.start)?;
        let end = midnight.checked_add_signed(end_offset)?;

        let window = Window {
            start: resolve_local(&self.location, start)?,
            end: resolve_local(&self.location, end)?,
        };
        debug!(
            "Resolved window for {}: {} .. {}",
            date,
            window.start.to_rfc3339(),
            window.end.to_rfc3339()
        );
        Some(window)
    }
}

impl fmt::Display for FloatingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} on {} ({})",
            format_offset(&self.start),
            format_offset(&self.end),
            self.days,
            self.location.name()
        )
    }
}

impl fmt::Debug for FloatingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloatingPeriod")
            .field("start", &format_offset(&self.start))
            .field("end", &format_offset(&self.end))
            .field("days", &self.days)
            .field("location", &self.location.name())
            .finish()
    }
}

/// Iterator over successive occurrences of a period
pub struct Windows<'a> {
    period: &'a FloatingPeriod,
    next: Option<NaiveDate>,
}

impl Iterator for Windows<'_> {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        // Days are never empty, so this finds a window within a week
        for _ in 0..7 {
            let date = self.next?;
            self.next = date.succ_opt();
            if let Some(window) = self.period.window_on(date) {
                return Some(window);
            }
        }
        None
    }
}

/// Parse a time-of-day offset such as `09:00`, `9:00` or `22:30:15`
pub fn parse_offset(field: Field, input: &str) -> Result<TimeDelta, ValidationError> {
    let malformed = || ValidationError::MalformedOffset {
        field,
        input: input.to_string(),
    };

    let parts: Vec<&str> = input.trim().split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(malformed());
    }

    let mut values = [0i64; 3];
    for (i, (slot, part)) in values.iter_mut().zip(&parts).enumerate() {
        // Hours may be a single digit; minutes and seconds are always two
        let width_ok = if i == 0 {
            (1..=2).contains(&part.len())
        } else {
            part.len() == 2
        };
        if !width_ok || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        *slot = part.parse().map_err(|_| malformed())?;
    }

    let [hours, minutes, seconds] = values;
    if minutes >= 60 || seconds >= 60 {
        return Err(malformed());
    }

    let offset = TimeDelta::seconds(hours * 3600 + minutes * 60 + seconds);
    check_offset(field, offset)?;
    Ok(offset)
}

/// Resolve an IANA timezone name
pub fn parse_location(name: &str) -> Result<Tz, ValidationError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ValidationError::InvalidLocation(name.to_string()))
}

fn check_inputs(
    start: TimeDelta,
    end: TimeDelta,
    days: ApplicableDays,
) -> Result<(), ValidationError> {
    check_offset(Field::Start, start)?;
    check_offset(Field::End, end)?;
    if days.is_empty() {
        return Err(ValidationError::EmptyDays);
    }
    Ok(())
}

fn check_offset(field: Field, offset: TimeDelta) -> Result<(), ValidationError> {
    if offset_in_range(offset.num_nanoseconds().unwrap_or(i64::MAX)) {
        Ok(())
    } else {
        Err(ValidationError::OffsetOutOfRange { field, offset })
    }
}

/// Offsets are valid in `[0, 24h)`, measured in nanoseconds
fn offset_in_range(nanos: i64) -> bool {
    (0..24 * 3600 * 1_000_000_000).contains(&nanos)
}

fn time_of_day(time: NaiveTime) -> TimeDelta {
    TimeDelta::seconds(time.num_seconds_from_midnight() as i64)
        + TimeDelta::nanoseconds(time.nanosecond() as i64)
}

/// Map a civil datetime to an instant.
///
/// Ambiguous times (DST overlap) take the earliest instant. Times inside a
/// DST gap are shifted forward by the length of the gap. None only when
/// the shift leaves chrono's calendar.
fn resolve_local(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return Some(dt);
    }
    let probe = naive.checked_sub_signed(GAP_PROBE)?;
    match tz.from_local_datetime(&probe).earliest() {
        Some(before) => before.checked_add_signed(GAP_PROBE),
        None => Some(tz.from_utc_datetime(&naive)),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn offset() -> impl Strategy<Value = TimeDelta> {
        (0i64..24 * 3600).prop_map(TimeDelta::seconds)
    }

    fn days() -> impl Strategy<Value = ApplicableDays> {
        (1u8..=0x7f).prop_map(|mask| {
            (0u8..7)
                .filter(move |i| mask & (1 << i) != 0)
                .map(weekday_from_index)
                .collect()
        })
    }

    fn weekday_from_index(i: u8) -> chrono::Weekday {
        let mut day = chrono::Weekday::Mon;
        for _ in 0..i {
            day = day.succ();
        }
        day
    }

    fn instant() -> impl Strategy<Value = DateTime<Utc>> {
        // 1970 .. ~2100
        (0i64..4_102_444_800).prop_map(|secs| {
            DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default()
        })
    }

    proptest! {
        /// window_at agrees with contains, and the window holds the instant
        #[test]
        fn window_at_agrees_with_contains(
            start in offset(), end in offset(), days in days(), t in instant()
        ) {
            let p = FloatingPeriod::new(start, end, days, "UTC").unwrap();
            match p.window_at(&t) {
                Some(w) => {
                    prop_assert!(p.contains(&t));
                    prop_assert!(w.contains(&t));
                }
                None => prop_assert!(!p.contains(&t)),
            }
        }

        /// Repeated queries give the same answer
        #[test]
        fn contains_is_idempotent(
            start in offset(), end in offset(), days in days(), t in instant()
        ) {
            let p = FloatingPeriod::new(start, end, days, "UTC").unwrap();
            let first = p.contains(&t);
            for _ in 0..3 {
                prop_assert_eq!(p.contains(&t), first);
            }
        }

        /// The next window starts no earlier than the query and within 8 days
        #[test]
        fn next_window_is_ahead(
            start in offset(), end in offset(), days in days(), t in instant()
        ) {
            let p = FloatingPeriod::new(start, end, days, "UTC").unwrap();
            let w = p.next_window(&t);
            prop_assert!(w.is_some());
            let w = w.unwrap();
            prop_assert!(w.start >= t);
            prop_assert!(w.start.signed_duration_since(t) <= TimeDelta::days(8));
        }

        /// Formatted offsets parse back to the same value
        #[test]
        fn offset_text_round_trips(d in offset()) {
            for field in [Field::Start, Field::End] {
                prop_assert_eq!(parse_offset(field, &format_offset(&d)), Ok(d));
            }
        }

        /// Offsets in range always construct; out of range never does
        #[test]
        fn offset_range_enforced(secs in -200_000i64..200_000i64) {
            let result = FloatingPeriod::new(
                TimeDelta::seconds(secs),
                TimeDelta::zero(),
                ApplicableDays::all(),
                "UTC",
            );
            prop_assert_eq!(result.is_ok(), (0..86_400).contains(&secs));
        }
    }
}

/// Kani formal verification proofs
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    #[kani::proof]
    fn offset_range_is_half_open() {
        let nanos: i64 = kani::any();
        let expected = nanos >= 0 && nanos < 86_400_000_000_000;
        kani::assert(offset_in_range(nanos) == expected, "offset range must be [0, 24h)");
    }
}
