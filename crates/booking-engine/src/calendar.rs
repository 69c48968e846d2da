//! Calendar arithmetic over a single configured local calendar.
//!
//! Instants are stored as `DateTime<Utc>`. Anything that talks about
//! "days", "weeks" or "months" is computed on the wall-clock fields of the
//! configured IANA zone and converted back, so a daily 09:00 appointment is
//! still at 09:00 on the far side of a DST transition. Sub-day shifts
//! (`add_hours`, `add_minutes`) are absolute durations.
//!
//! All functions take explicit inputs; the only wall-clock read in the
//! crate lives behind [`crate::clock::Clock`].
//!
//! # Local time resolution
//!
//! - A local time inside a spring-forward gap resolves forward by the length
//!   of the gap (02:30 on the transition day becomes 03:30).
//! - An ambiguous local time in a fall-back overlap resolves to the earlier
//!   of the two instants.

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Utc, Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

// ── Configurable week start ─────────────────────────────────────────────────

/// Which day begins a week for [`Calendar::week_dates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStartDay {
    /// ISO 8601 standard (Monday = day 0 of the week).
    #[default]
    Monday,
    /// US/Canada convention (Sunday = day 0 of the week).
    Sunday,
}

/// How many days `weekday` is from the week-start day.
fn days_from_week_start(weekday: Weekday, week_start: WeekStartDay) -> i64 {
    match week_start {
        WeekStartDay::Monday => weekday.num_days_from_monday() as i64,
        WeekStartDay::Sunday => weekday.num_days_from_sunday() as i64,
    }
}

// ── Calendar ────────────────────────────────────────────────────────────────

/// A local calendar: an IANA zone plus a week-start convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    tz: Tz,
    week_start: WeekStartDay,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            week_start: WeekStartDay::default(),
        }
    }

    /// A calendar whose local days are UTC days.
    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    /// Build a calendar from an IANA zone name.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidTimezone`] for an unknown zone name.
    pub fn from_name(timezone: &str) -> Result<Self, ScheduleError> {
        parse_timezone(timezone).map(Self::new)
    }

    pub fn with_week_start(mut self, week_start: WeekStartDay) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn week_start(&self) -> WeekStartDay {
        self.week_start
    }

    /// The instant expressed on this calendar's wall clock.
    pub fn local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    // ── Field arithmetic ────────────────────────────────────────────────────

    /// Shift by `days` calendar days, keeping the local wall-clock time.
    ///
    /// # Examples
    ///
    /// ```
    /// use booking_engine::calendar::Calendar;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let cal = Calendar::from_name("America/New_York").unwrap();
    /// // 09:00 EST the day before the March 2026 spring-forward
    /// let before = Utc.with_ymd_and_hms(2026, 3, 7, 14, 0, 0).unwrap();
    /// let after = cal.add_days(before, 1).unwrap();
    /// // still 09:00 local, now EDT (UTC-4)
    /// assert_eq!(after, Utc.with_ymd_and_hms(2026, 3, 8, 13, 0, 0).unwrap());
    /// ```
    pub fn add_days(
        &self,
        instant: DateTime<Utc>,
        days: i64,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        let local = self.local(instant);
        let date = Duration::try_days(days)
            .and_then(|d| local.date_naive().checked_add_signed(d))
            .ok_or_else(|| out_of_range(instant, format!("{days:+} days")))?;
        self.resolve_local(date.and_time(local.time()))
    }

    /// Shift by `weeks` calendar weeks (7 calendar days each).
    pub fn add_weeks(
        &self,
        instant: DateTime<Utc>,
        weeks: i64,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        let days = weeks
            .checked_mul(7)
            .ok_or_else(|| out_of_range(instant, format!("{weeks:+} weeks")))?;
        self.add_days(instant, days)
    }

    /// Shift by `months` calendar months, keeping the local wall-clock time.
    ///
    /// Days past the end of a shorter target month clamp to its last day:
    /// January 31 plus one month is February 28 (29 in leap years).
    pub fn add_months(
        &self,
        instant: DateTime<Utc>,
        months: i32,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        let local = self.local(instant);
        let date = local.date_naive();
        let span = Months::new(months.unsigned_abs());
        let shifted = if months >= 0 {
            date.checked_add_months(span)
        } else {
            date.checked_sub_months(span)
        }
        .ok_or_else(|| out_of_range(instant, format!("{months:+} months")))?;
        self.resolve_local(shifted.and_time(local.time()))
    }

    /// Shift by an absolute number of hours.
    pub fn add_hours(
        &self,
        instant: DateTime<Utc>,
        hours: i64,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        Duration::try_hours(hours)
            .and_then(|d| instant.checked_add_signed(d))
            .ok_or_else(|| out_of_range(instant, format!("{hours:+} hours")))
    }

    /// Shift by an absolute number of minutes.
    pub fn add_minutes(
        &self,
        instant: DateTime<Utc>,
        minutes: i64,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        Duration::try_minutes(minutes)
            .and_then(|d| instant.checked_add_signed(d))
            .ok_or_else(|| out_of_range(instant, format!("{minutes:+} minutes")))
    }

    // ── Day boundaries ──────────────────────────────────────────────────────

    /// Local 00:00:00.000 of the day containing `instant`.
    pub fn start_of_day(&self, instant: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        self.resolve_local(self.local(instant).date_naive().and_time(NaiveTime::MIN))
    }

    /// Local 23:59:59.999 of the day containing `instant`.
    pub fn end_of_day(&self, instant: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        let naive = self
            .local(instant)
            .date_naive()
            .and_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| out_of_range(instant, "end of day".to_string()))?;
        self.resolve_local(naive)
    }

    /// Whether two instants fall on the same local calendar day.
    pub fn is_same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.local(a).date_naive() == self.local(b).date_naive()
    }

    /// Local midnight of each of the seven days in the week containing
    /// `instant`, beginning on the calendar's week-start day.
    pub fn week_dates(&self, instant: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>, ScheduleError> {
        let local = self.local(instant);
        let offset = days_from_week_start(local.weekday(), self.week_start);
        let first: NaiveDate = local
            .date_naive()
            .checked_sub_signed(Duration::days(offset))
            .ok_or_else(|| out_of_range(instant, "week dates".to_string()))?;
        (0..7)
            .map(|i| {
                let date = first
                    .checked_add_signed(Duration::days(i))
                    .ok_or_else(|| out_of_range(instant, "week dates".to_string()))?;
                self.resolve_local(date.and_time(NaiveTime::MIN))
            })
            .collect()
    }

    // ── Internal helpers ────────────────────────────────────────────────────

    /// Map a local wall-clock time to an instant, resolving DST gaps forward
    /// and overlaps to the earlier instant.
    fn resolve_local(&self, naive: NaiveDateTime) -> Result<DateTime<Utc>, ScheduleError> {
        if let Some(dt) = self.tz.from_local_datetime(&naive).earliest() {
            return Ok(dt.with_timezone(&Utc));
        }

        // Inside a gap: read the wall clock with the offset that was in effect
        // just before the transition.
        let probe = naive
            .checked_sub_signed(Duration::days(1))
            .ok_or_else(|| ScheduleError::OutOfRange(format!("'{naive}'")))?;
        let before = self.tz.offset_from_utc_datetime(&probe).fix().local_minus_utc();
        let utc = naive
            .checked_sub_signed(Duration::seconds(i64::from(before)))
            .ok_or_else(|| ScheduleError::OutOfRange(format!("'{naive}'")))?;
        Ok(Utc.from_utc_datetime(&utc))
    }
}

// ── Parsing ─────────────────────────────────────────────────────────────────

/// Parse an RFC 3339 datetime string into `DateTime<Utc>`.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidDatetime`] if the string is not RFC 3339.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, ScheduleError> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ScheduleError::InvalidDatetime(format!("'{}': {}", s, e)))
}

/// Parse an IANA timezone string into `Tz`.
pub(crate) fn parse_timezone(s: &str) -> Result<Tz, ScheduleError> {
    s.parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimezone(format!("'{}'", s)))
}

fn out_of_range(instant: DateTime<Utc>, shift: String) -> ScheduleError {
    ScheduleError::OutOfRange(format!("{} shifted by {}", instant.to_rfc3339(), shift))
}

// ── Tests ───────────────────────────────────────────────────────────────────
