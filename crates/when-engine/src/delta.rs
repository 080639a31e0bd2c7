//! Calendar-aware duration fields and arithmetic.
//!
//! [`CalendarDelta`] is the bridge between parsed duration fields and actual
//! datetimes. Variable-length units (years, months) shift calendar fields with
//! end-of-month clamping; weeks and smaller units are fixed-length. Naive
//! seconds-per-month arithmetic is exactly what this module exists to avoid.

use chrono::{DateTime, Datelike, Days, Duration, Months, TimeZone, Utc};
use serde::Serialize;

/// A unit of time recognized by the parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TimeUnit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    /// Whether the unit is a day or longer, i.e. shifts the date rather than
    /// the time of day.
    pub fn is_date_sized(self) -> bool {
        matches!(
            self,
            TimeUnit::Years | TimeUnit::Months | TimeUnit::Weeks | TimeUnit::Days
        )
    }
}

/// Non-negative duration fields, one slot per unit.
///
/// Absent units are zero. The microseconds slot is only ever populated by
/// [`CalendarDelta::between`]; the parsers work at whole-second granularity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CalendarDelta {
    pub years: u64,
    pub months: u64,
    pub weeks: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub microseconds: u32,
}

impl CalendarDelta {
    /// Set the field for `unit` to `value`.
    pub fn set(&mut self, unit: TimeUnit, value: u64) {
        match unit {
            TimeUnit::Years => self.years = value,
            TimeUnit::Months => self.months = value,
            TimeUnit::Weeks => self.weeks = value,
            TimeUnit::Days => self.days = value,
            TimeUnit::Hours => self.hours = value,
            TimeUnit::Minutes => self.minutes = value,
            TimeUnit::Seconds => self.seconds = value,
        }
    }

    /// Add the delta to `dt` with calendar-aware semantics.
    ///
    /// Years and months move calendar fields (Jan 31 + 1 month = Feb 28/29);
    /// weeks and days move whole days; the rest is fixed-length seconds.
    /// Returns `None` if any step leaves the representable range.
    pub fn add_to<Tz: TimeZone>(&self, dt: DateTime<Tz>) -> Option<DateTime<Tz>> {
        let months = self.years.checked_mul(12)?.checked_add(self.months)?;
        let dt = dt.checked_add_months(Months::new(u32::try_from(months).ok()?))?;

        let days = self.weeks.checked_mul(7)?.checked_add(self.days)?;
        let dt = dt.checked_add_days(Days::new(days))?;

        let secs = i64::try_from(self.hours)
            .ok()?
            .checked_mul(3600)?
            .checked_add(i64::try_from(self.minutes).ok()?.checked_mul(60)?)?
            .checked_add(i64::try_from(self.seconds).ok()?)?;
        dt.checked_add_signed(Duration::try_seconds(secs)?)
    }

    /// Decompose `later - earlier` into calendar components.
    ///
    /// Whole calendar months come off first (so "March 5 to April 5" is one
    /// month regardless of March's length), then the remainder is split into
    /// days, hours, minutes, seconds, and microseconds. Weeks are folded into
    /// days. `later` must not precede `earlier`; if it does, the zero delta is
    /// returned.
    pub fn between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> CalendarDelta {
        if later <= earlier {
            return CalendarDelta::default();
        }

        let mut months = i64::from(later.year() - earlier.year()) * 12
            + (i64::from(later.month()) - i64::from(earlier.month()));
        let mut anchor = add_whole_months(earlier, months, later);
        if anchor > later {
            // The clamped anchor overshot (e.g. Jan 31 + 1 month lands on
            // Feb 28 but past the target's time of day): borrow one month.
            months -= 1;
            anchor = add_whole_months(earlier, months, later);
        }

        let rest = later - anchor;
        let total = rest.num_seconds();

        CalendarDelta {
            years: (months / 12) as u64,
            months: (months % 12) as u64,
            weeks: 0,
            days: (total / 86_400) as u64,
            hours: ((total % 86_400) / 3_600) as u64,
            minutes: ((total % 3_600) / 60) as u64,
            seconds: (total % 60) as u64,
            microseconds: (rest.subsec_nanos() / 1_000) as u32,
        }
    }
}

/// `earlier` advanced by `months` calendar months, saturating at `later`.
fn add_whole_months(earlier: DateTime<Utc>, months: i64, later: DateTime<Utc>) -> DateTime<Utc> {
    u32::try_from(months)
        .ok()
        .and_then(|m| earlier.checked_add_months(Months::new(m)))
        .unwrap_or(later)
}
