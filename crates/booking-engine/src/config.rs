//! Scheduler configuration.
//!
//! Loaded once when a store is built and never changed afterwards. Every
//! field has a default, so an empty JSON object is a valid configuration.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{parse_timezone, Calendar, WeekStartDay};
use crate::error::ScheduleError;

/// Minimum lead time between "now" and a new appointment's start.
pub const MINIMUM_ADVANCE_BOOKING_HOURS: i64 = 3;
/// Shortest bookable appointment.
pub const MINIMUM_APPOINTMENT_DURATION_MINUTES: i64 = 15;
/// Granularity of the presentation grid.
pub const TIME_SLOT_DURATION_MINUTES: i64 = 15;
/// First hour shown as bookable.
pub const BUSINESS_HOURS_START: u32 = 8;
/// Hour at which the bookable window closes.
pub const BUSINESS_HOURS_END: u32 = 20;
/// How far ahead an open-ended recurrence is expanded.
pub const DEFAULT_RECURRENCE_HORIZON_DAYS: i64 = 90;
/// Upper bound on the occurrences a single definition may produce.
pub const MAX_OCCURRENCES: usize = 366;

/// Largest accepted advance-notice window (one leap year).
pub const MAX_ADVANCE_BOOKING_HOURS: i64 = 366 * 24;
/// Largest accepted minimum duration or slot size (one day).
pub const MAX_DURATION_MINUTES: i64 = 24 * 60;
/// Largest accepted horizon for open-ended series (ten years).
pub const MAX_RECURRENCE_HORIZON_DAYS: i64 = 3660;

/// Local business-hours window, `[start_hour, end_hour)`.
///
/// Display-only: booking validation never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start_hour: BUSINESS_HOURS_START,
            end_hour: BUSINESS_HOURS_END,
        }
    }
}

impl BusinessHours {
    /// Whether `instant` falls inside the window on `calendar`'s wall clock.
    pub fn contains(&self, calendar: &Calendar, instant: DateTime<Utc>) -> bool {
        let hour = calendar.local(instant).hour();
        hour >= self.start_hour && hour < self.end_hour
    }
}

/// Thresholds the booking validator enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    pub min_advance_booking_hours: i64,
    pub min_duration_minutes: i64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            min_advance_booking_hours: MINIMUM_ADVANCE_BOOKING_HOURS,
            min_duration_minutes: MINIMUM_APPOINTMENT_DURATION_MINUTES,
        }
    }
}

/// Everything a store needs to know up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// IANA zone whose wall clock defines "a day".
    pub timezone: String,
    pub week_start: WeekStartDay,
    pub min_advance_booking_hours: i64,
    pub min_appointment_duration_minutes: i64,
    pub time_slot_duration_minutes: i64,
    pub business_hours: BusinessHours,
    pub default_horizon_days: i64,
    pub max_occurrences: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            week_start: WeekStartDay::Sunday,
            min_advance_booking_hours: MINIMUM_ADVANCE_BOOKING_HOURS,
            min_appointment_duration_minutes: MINIMUM_APPOINTMENT_DURATION_MINUTES,
            time_slot_duration_minutes: TIME_SLOT_DURATION_MINUTES,
            business_hours: BusinessHours::default(),
            default_horizon_days: DEFAULT_RECURRENCE_HORIZON_DAYS,
            max_occurrences: MAX_OCCURRENCES,
        }
    }
}

impl SchedulerConfig {
    /// Parse a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidConfig`] for malformed JSON or values
    /// that fail [`SchedulerConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, ScheduleError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ScheduleError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values are usable.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        parse_timezone(&self.timezone)?;

        let bounded = [
            (
                "min_advance_booking_hours",
                self.min_advance_booking_hours,
                MAX_ADVANCE_BOOKING_HOURS,
            ),
            (
                "min_appointment_duration_minutes",
                self.min_appointment_duration_minutes,
                MAX_DURATION_MINUTES,
            ),
            (
                "time_slot_duration_minutes",
                self.time_slot_duration_minutes,
                MAX_DURATION_MINUTES,
            ),
            (
                "default_horizon_days",
                self.default_horizon_days,
                MAX_RECURRENCE_HORIZON_DAYS,
            ),
        ];
        for (name, value, max) in bounded {
            if value <= 0 {
                return Err(ScheduleError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
            if value > max {
                return Err(ScheduleError::InvalidConfig(format!(
                    "{name} must be at most {max}, got {value}"
                )));
            }
        }
        if self.max_occurrences == 0 {
            return Err(ScheduleError::InvalidConfig(
                "max_occurrences must be positive".to_string(),
            ));
        }

        let hours = self.business_hours;
        if hours.start_hour >= hours.end_hour || hours.end_hour > 24 {
            return Err(ScheduleError::InvalidConfig(format!(
                "business hours {:02}:00-{:02}:00 are not a window within one day",
                hours.start_hour, hours.end_hour
            )));
        }
        Ok(())
    }

    /// The local calendar this configuration describes.
    pub fn calendar(&self) -> Result<Calendar, ScheduleError> {
        Ok(Calendar::from_name(&self.timezone)?.with_week_start(self.week_start))
    }

    pub fn booking_policy(&self) -> BookingPolicy {
        BookingPolicy {
            min_advance_booking_hours: self.min_advance_booking_hours,
            min_duration_minutes: self.min_appointment_duration_minutes,
        }
    }
}
