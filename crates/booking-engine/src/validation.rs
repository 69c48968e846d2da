//! Booking validation.
//!
//! A single pass over a proposed appointment that returns every violated
//! rule as a field-tagged [`ValidationError`]. Validation never fails: a
//! rejected booking is an ordinary value for the caller to display.
//!
//! Rules, in the order their errors are reported:
//!
//! 1. `title`: the trimmed title is non-empty.
//! 2. `time`: the start is before the end.
//! 3. `duration`: a well-ordered interval lasts at least the minimum.
//! 4. `startTime`: the end is not in the past.
//! 5. `startTime`: the start honors the advance-notice window.
//! 6. `time`: nothing in the existing schedule overlaps.
//!
//! Rules 4 and 5 overlap in intent and can both fire for the same input.
//! Business hours are not checked here.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::appointment::Occurrence;
use crate::config::BookingPolicy;
use crate::conflict::{has_conflict, Interval};

/// Which input a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationField {
    Title,
    Time,
    Duration,
    StartTime,
}

/// One violated booking rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: ValidationField,
    pub message: String,
}

impl ValidationError {
    fn new(field: ValidationField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a proposed booking against the rules and the existing schedule.
///
/// `existing` must be the materialized occurrence set, so every instance of
/// a recurring series is considered.
///
/// # Examples
///
/// ```
/// use booking_engine::config::BookingPolicy;
/// use booking_engine::validation::{validate_booking, ValidationField};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap();
/// let start = now + Duration::hours(1);
/// let errors = validate_booking(
///     "",
///     start,
///     start + Duration::minutes(15),
///     &[],
///     now,
///     &BookingPolicy::default(),
/// );
/// let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
/// assert_eq!(fields, vec![ValidationField::Title, ValidationField::StartTime]);
/// ```
pub fn validate_booking(
    title: &str,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    existing: &[Occurrence],
    now: DateTime<Utc>,
    policy: &BookingPolicy,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if title.trim().is_empty() {
        errors.push(ValidationError::new(ValidationField::Title, "Title is required"));
    }

    let well_ordered = start_time < end_time;
    if !well_ordered {
        errors.push(ValidationError::new(
            ValidationField::Time,
            "End time must be after start time",
        ));
    }

    // A minimum too large to represent is longer than any real interval.
    let too_short = match Duration::try_minutes(policy.min_duration_minutes) {
        Some(minimum) => end_time - start_time < minimum,
        None => true,
    };
    if well_ordered && too_short {
        errors.push(ValidationError::new(
            ValidationField::Duration,
            format!(
                "Minimum appointment duration is {} minutes",
                policy.min_duration_minutes
            ),
        ));
    }

    if end_time < now {
        errors.push(ValidationError::new(
            ValidationField::StartTime,
            "Cannot book appointments in the past",
        ));
    }

    let earliest_start = Duration::try_hours(policy.min_advance_booking_hours)
        .and_then(|notice| now.checked_add_signed(notice));
    if earliest_start.map_or(true, |earliest| start_time < earliest) {
        errors.push(ValidationError::new(
            ValidationField::StartTime,
            format!(
                "Appointments must be booked at least {} hours in advance",
                policy.min_advance_booking_hours
            ),
        ));
    }

    if has_conflict(&Interval::new(start_time, end_time), existing) {
        errors.push(ValidationError::new(
            ValidationField::Time,
            "This time slot conflicts with an existing appointment",
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::appointment::{AppointmentId, Frequency};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap()
    }

    fn tomorrow(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 17, h, m, 0).unwrap()
    }

    fn busy(start: DateTime<Utc>, end: DateTime<Utc>) -> Occurrence {
        Occurrence {
            source_id: AppointmentId::from("busy"),
            occurrence_index: 0,
            start_time: start,
            end_time: end,
            title: "Client Meeting".to_string(),
            description: None,
            recurrence_frequency: Frequency::None,
        }
    }

    fn fields(errors: &[ValidationError]) -> Vec<ValidationField> {
        errors.iter().map(|e| e.field).collect()
    }

    fn check(
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        existing: &[Occurrence],
    ) -> Vec<ValidationError> {
        validate_booking(title, start, end, existing, now(), &BookingPolicy::default())
    }

    #[test]
    fn test_valid_booking_has_no_errors() {
        assert!(check("Review", tomorrow(10, 0), tomorrow(11, 0), &[]).is_empty());
    }

    #[test]
    fn test_blank_title_rejected() {
        let errors = check("   ", tomorrow(10, 0), tomorrow(11, 0), &[]);
        assert_eq!(fields(&errors), vec![ValidationField::Title]);
        assert_eq!(errors[0].message, "Title is required");
    }

    #[test]
    fn test_empty_title_and_reversed_times_yield_exactly_two_errors() {
        let errors = check("", tomorrow(11, 0), tomorrow(10, 0), &[]);
        assert_eq!(fields(&errors), vec![ValidationField::Title, ValidationField::Time]);
    }

    #[test]
    fn test_equal_start_and_end_is_a_time_error() {
        let errors = check("Review", tomorrow(10, 0), tomorrow(10, 0), &[]);
        assert_eq!(fields(&errors), vec![ValidationField::Time]);
    }

    #[test]
    fn test_short_duration_rejected() {
        let errors = check("Review", tomorrow(10, 0), tomorrow(10, 14), &[]);
        assert_eq!(fields(&errors), vec![ValidationField::Duration]);
        assert_eq!(errors[0].message, "Minimum appointment duration is 15 minutes");
    }

    #[test]
    fn test_exact_minimum_duration_accepted() {
        assert!(check("Review", tomorrow(10, 0), tomorrow(10, 15), &[]).is_empty());
    }

    #[test]
    fn test_short_notice_empty_title_scenario() {
        let start = now() + Duration::hours(1);
        let errors = check("", start, start + Duration::minutes(15), &[]);
        assert_eq!(
            fields(&errors),
            vec![ValidationField::Title, ValidationField::StartTime]
        );
        assert!(errors[1].message.contains("3 hours in advance"));
    }

    #[test]
    fn test_past_booking_fires_both_notice_rules() {
        let start = now() - Duration::hours(2);
        let errors = check("Review", start, start + Duration::hours(1), &[]);
        assert_eq!(
            fields(&errors),
            vec![ValidationField::StartTime, ValidationField::StartTime]
        );
        assert_eq!(errors[0].message, "Cannot book appointments in the past");
    }

    #[test]
    fn test_end_exactly_now_is_not_past() {
        let errors = check("Review", now() - Duration::hours(1), now(), &[]);
        assert_eq!(fields(&errors), vec![ValidationField::StartTime]);
        assert!(errors[0].message.contains("in advance"));
    }

    #[test]
    fn test_advance_notice_boundary() {
        let start = now() + Duration::hours(3);
        assert!(check("Review", start, start + Duration::hours(1), &[]).is_empty());

        let start = start - Duration::seconds(1);
        let errors = check("Review", start, start + Duration::hours(1), &[]);
        assert_eq!(fields(&errors), vec![ValidationField::StartTime]);
    }

    #[test]
    fn test_overlap_rejected_touching_accepted() {
        let existing = [busy(tomorrow(14, 0), tomorrow(15, 0))];

        let errors = check("Review", tomorrow(14, 30), tomorrow(15, 30), &existing);
        assert_eq!(fields(&errors), vec![ValidationField::Time]);
        assert_eq!(
            errors[0].message,
            "This time slot conflicts with an existing appointment"
        );

        assert!(check("Review", tomorrow(15, 0), tomorrow(16, 0), &existing).is_empty());
    }

    #[test]
    fn test_business_hours_not_enforced() {
        assert!(check("Late call", tomorrow(21, 0), tomorrow(22, 0), &[]).is_empty());
        assert!(check("Early call", tomorrow(6, 0), tomorrow(6, 30), &[]).is_empty());
    }

    #[test]
    fn test_policy_thresholds_are_respected() {
        let policy = BookingPolicy {
            min_advance_booking_hours: 48,
            min_duration_minutes: 60,
        };
        let errors =
            validate_booking("Review", tomorrow(10, 0), tomorrow(10, 30), &[], now(), &policy);
        assert_eq!(
            fields(&errors),
            vec![ValidationField::Duration, ValidationField::StartTime]
        );
        assert!(errors[0].message.contains("60 minutes"));
        assert!(errors[1].message.contains("48 hours"));
    }

    #[test]
    fn test_unrepresentable_thresholds_reject_instead_of_panicking() {
        let policy = BookingPolicy {
            min_advance_booking_hours: i64::MAX,
            min_duration_minutes: i64::MAX,
        };
        let errors =
            validate_booking("Review", tomorrow(10, 0), tomorrow(11, 0), &[], now(), &policy);
        assert_eq!(
            fields(&errors),
            vec![ValidationField::Duration, ValidationField::StartTime]
        );
    }

    #[test]
    fn test_every_rule_can_fire_together() {
        // Reversed, in the past, blank, and overlapping an enclosing slot.
        let existing = [busy(now() - Duration::hours(5), now())];
        let errors = check(
            "",
            now() - Duration::hours(2),
            now() - Duration::hours(3),
            &existing,
        );
        assert_eq!(
            fields(&errors),
            vec![
                ValidationField::Title,
                ValidationField::Time,
                ValidationField::StartTime,
                ValidationField::StartTime,
                ValidationField::Time,
            ]
        );
    }

    #[test]
    fn test_field_names_serialize_like_the_form() {
        let error = ValidationError::new(ValidationField::StartTime, "x");
        let json = serde_json::to_value(error).unwrap();
        assert_eq!(json["field"], "startTime");
    }
}
