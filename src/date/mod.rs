//! Calendar-aware date/time engine: a UTC instant stored as a day number
//! plus a millisecond-of-day offset, decomposed into civil form by a
//! pluggable [`Calendar`], with arithmetic, a template-driven parser and a
//! strftime-style formatter.

pub mod calendar;
pub mod format;
pub mod parse;
pub mod timezone;

use crate::bignum::{arith, BigNumber};
use crate::error::{Result, VmError};

pub use calendar::{Calendar, Gregorian, Julian};
pub use timezone::{TimeZone, Transition, ZoneCache, ZoneRecord};

/// Milliseconds in a day; `daytime` always lies in `0..MS_PER_DAY`.
pub const MS_PER_DAY: i64 = 86_400_000;

/// Internal day number of the Unix epoch (1970-01-01 UTC), on the
/// day-0-is-0000-03-01 axis.
pub const UNIX_EPOCH_DAYNO: i64 = 719_468;

/// Internal day number whose Julian Day Number is 0 (noon UTC,
/// proleptic Julian calendar 4713 BC); `dayno - JULIAN_EPOCH_DAYNO` is the
/// midnight JDN for that day.
pub const JULIAN_EPOCH_DAYNO: i64 = -1_721_120;

/// A UTC instant at millisecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Date {
    dayno: i64,
    daytime: i64,
}

impl Date {
    /// Construct directly from a day number and millisecond-of-day,
    /// normalizing an out-of-range `daytime` by carrying into `dayno`.
    pub fn new(dayno: i64, daytime: i64) -> Self {
        let carry = daytime.div_euclid(MS_PER_DAY);
        Self {
            dayno: dayno + carry,
            daytime: daytime.rem_euclid(MS_PER_DAY),
        }
    }

    /// The internal day number.
    pub fn dayno(&self) -> i64 {
        self.dayno
    }

    /// Milliseconds since local midnight on `dayno`.
    pub fn daytime(&self) -> i64 {
        self.daytime
    }

    /// Decompose into (year, month, day) under `calendar`.
    pub fn civil(&self, calendar: &dyn Calendar) -> (i64, u8, u8) {
        calendar.set_dayno(self.dayno)
    }

    /// Construct from civil (year, month, day) plus a time-of-day in
    /// milliseconds, under `calendar`.
    pub fn from_civil(calendar: &dyn Calendar, year: i64, month: u8, day: u8, daytime: i64) -> Self {
        Self::new(calendar.set_date(year, month, day), daytime)
    }

    /// Add a whole number of days.
    pub fn add_days(&self, days: i64) -> Self {
        Self::new(self.dayno + days, self.daytime)
    }

    /// Add a fractional number of days carried as a `BigNumber`.
    pub fn add_bignum_days(&self, days: &BigNumber) -> Result<Self> {
        let ms_per_day = BigNumber::from_i32(MS_PER_DAY as i32, Some(days.precision().max(12)));
        let total_ms = arith::mul(days, &ms_per_day);
        let whole_ms = total_ms.round_to(total_ms.precision()).to_i32().map_err(|_| VmError::NumOverflow)?;
        Ok(Self::new(self.dayno, self.daytime + whole_ms as i64))
    }

    /// Difference between two instants as whole-plus-fractional days.
    pub fn diff_days(&self, other: &Self, precision: u16) -> BigNumber {
        let day_diff = BigNumber::from_i32((self.dayno - other.dayno) as i32, Some(precision));
        let ms_diff = BigNumber::from_i32((self.daytime - other.daytime) as i32, Some(precision));
        let ms_per_day = BigNumber::from_i32(MS_PER_DAY as i32, Some(precision));
        let frac = arith::div(&ms_diff, &ms_per_day).unwrap_or_else(|_| BigNumber::zero(precision));
        arith::add(&day_diff, &frac)
    }

    /// Add calendar-relative components: years, months, days, hours,
    /// minutes, seconds. Months
    /// (and the years folded into them) carry through the calendar so
    /// month-end overflow follows that calendar's rules; time components
    /// accumulate arithmetically and any day overflow carries into `dayno`.
    pub fn add_interval(&self, calendar: &dyn Calendar, y: i64, mo: i64, d: i64, h: i64, mi: i64, s: i64) -> Self {
        let (year, month, day) = calendar.set_dayno(self.dayno);
        let total_months = (month as i64 - 1) + mo + y * 12;
        let new_year = year + total_months.div_euclid(12);
        let new_month = total_months.rem_euclid(12) as u8 + 1;
        let clamped_day = day.min(days_in_month(calendar, new_year, new_month));
        let dayno = calendar.set_date(new_year, new_month, clamped_day);

        let extra_ms = h * 3_600_000 + mi * 60_000 + s * 1000;
        Self::new(dayno + d, self.daytime + extra_ms)
    }

    /// The day of week on which `which`-th occurrence (positive: at/after,
    /// negative: at/before) of weekday `w` (Sunday = 0) falls, at midnight
    /// in this instant's own day reckoning.
    pub fn find_weekday(&self, calendar: &dyn Calendar, w: u8, which: i32) -> Self {
        let current = calendar.weekday(self.dayno);
        let mut dayno = if which >= 0 {
            self.dayno + ((w as i64 - current as i64).rem_euclid(7))
        } else {
            self.dayno - ((current as i64 - w as i64).rem_euclid(7))
        };
        let steps = which.unsigned_abs() as i64;
        if steps > 1 {
            let stride = if which >= 0 { 7 } else { -7 };
            dayno += stride * (steps as i64 - 1);
        }
        Self::new(dayno, 0)
    }
}

fn days_in_month(calendar: &dyn Calendar, year: i64, month: u8) -> u8 {
    let this_month = calendar.set_date(year, month, 1);
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let next = calendar.set_date(next_year, next_month, 1);
    (next - this_month) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_epoch_has_dayno_constant() {
        let cal = Gregorian;
        let d = Date::from_civil(&cal, 1970, 1, 1, 0);
        assert_eq!(d.dayno(), UNIX_EPOCH_DAYNO);
    }

    #[test]
    fn add_days_wraps_correctly() {
        let cal = Gregorian;
        let d = Date::from_civil(&cal, 2024, 2, 28, 0).add_days(1);
        assert_eq!(d.civil(&cal), (2024, 2, 29));
    }

    #[test]
    fn diff_days_round_trips_through_add() {
        let cal = Gregorian;
        let a = Date::from_civil(&cal, 2024, 1, 1, 0);
        let b = a.add_days(100);
        let diff = b.diff_days(&a, 20);
        assert_eq!(diff.to_i32().unwrap(), 100);
    }

    #[test]
    fn add_interval_clamps_month_end() {
        let cal = Gregorian;
        let d = Date::from_civil(&cal, 2024, 1, 31, 0);
        let next = d.add_interval(&cal, 0, 1, 0, 0, 0, 0);
        assert_eq!(next.civil(&cal), (2024, 2, 29));
    }

    #[test]
    fn find_weekday_locates_next_occurrence() {
        let cal = Gregorian;
        // 2024-01-01 was a Monday (weekday 1); find the next Friday (5).
        let d = Date::from_civil(&cal, 2024, 1, 1, 0);
        let friday = d.find_weekday(&cal, 5, 1);
        assert_eq!(cal.weekday(friday.dayno()), 5);
        assert!(friday.dayno() >= d.dayno());
    }
}
