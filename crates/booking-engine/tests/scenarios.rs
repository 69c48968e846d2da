//! End-to-end booking scenarios against the public API.

use booking_engine::{
    AppointmentDraft, AppointmentId, AppointmentStore, Calendar, FixedClock, Frequency,
    Recurrence, ScheduleError, SchedulerConfig, ValidationField, WeekStartDay,
};
use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use chrono_tz::America::New_York;

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn store_at(now: DateTime<Utc>) -> AppointmentStore<FixedClock> {
    AppointmentStore::with_clock(SchedulerConfig::default(), FixedClock::new(now)).unwrap()
}

#[test]
fn daily_standup_for_a_month() {
    let now = utc(2026, 3, 16, 10, 0);
    let mut store = store_at(now);
    let start = utc(2026, 3, 17, 9, 0);
    let draft = AppointmentDraft::new("Standup", start, start + Duration::minutes(30))
        .with_recurrence(Recurrence::new(Frequency::Daily).until(start + Duration::days(30)));
    let id = store.book(draft).unwrap();

    let occurrences = store.expand_all();
    assert_eq!(occurrences.len(), 31);
    for (i, o) in occurrences.iter().enumerate() {
        assert_eq!(o.source_id, id);
        assert_eq!(o.start_time, start + Duration::days(i as i64));
        assert_eq!(o.end_time - o.start_time, Duration::minutes(30));
    }
}

#[test]
fn short_notice_booking_with_blank_title() {
    let now = utc(2026, 3, 16, 10, 0);
    let mut store = store_at(now);
    let start = now + Duration::hours(1);
    let draft = AppointmentDraft::new("", start, start + Duration::minutes(15));

    let Err(ScheduleError::Rejected(errors)) = store.book(draft) else {
        panic!("booking should be rejected");
    };
    let fields: Vec<ValidationField> = errors.iter().map(|e| e.field).collect();
    assert_eq!(fields, vec![ValidationField::Title, ValidationField::StartTime]);
    assert!(store.is_empty());
}

#[test]
fn overlapping_and_adjacent_bookings() {
    let now = utc(2026, 3, 16, 10, 0);
    let mut store = store_at(now);
    store
        .book(AppointmentDraft::new(
            "Client Meeting",
            utc(2026, 3, 17, 14, 0),
            utc(2026, 3, 17, 15, 0),
        ))
        .unwrap();

    let clash = store.validate("Review", utc(2026, 3, 17, 14, 30), utc(2026, 3, 17, 15, 30));
    assert_eq!(clash.len(), 1);
    assert_eq!(clash[0].field, ValidationField::Time);

    let adjacent = store.validate("Review", utc(2026, 3, 17, 15, 0), utc(2026, 3, 17, 16, 0));
    assert!(adjacent.is_empty());
}

#[test]
fn update_of_unknown_id_leaves_store_untouched() {
    let mut store = store_at(utc(2026, 3, 16, 10, 0));
    let id = store
        .create(AppointmentDraft::new(
            "Keep",
            utc(2026, 3, 17, 9, 0),
            utc(2026, 3, 17, 10, 0),
        ))
        .unwrap();
    let before = store.list().to_vec();

    let err = store
        .update(
            &AppointmentId::from("does-not-exist"),
            AppointmentDraft::new("New", utc(2026, 3, 18, 9, 0), utc(2026, 3, 18, 10, 0)),
        )
        .unwrap_err();
    assert!(err.to_string().contains("not found"), "got: {err}");
    assert_eq!(store.list(), before.as_slice());
    assert!(store.get(&id).is_some());
}

#[test]
fn daily_series_keeps_wall_clock_across_spring_forward() {
    let config = SchedulerConfig {
        timezone: "America/New_York".to_string(),
        ..Default::default()
    };
    let now = utc(2026, 3, 1, 12, 0);
    let mut store = AppointmentStore::with_clock(config, FixedClock::new(now)).unwrap();

    // 09:00 EST on Mar 6; the US switches to EDT on Mar 8
    let start = utc(2026, 3, 6, 14, 0);
    let draft = AppointmentDraft::new("Standup", start, start + Duration::minutes(15))
        .with_recurrence(Recurrence::new(Frequency::Daily).until(utc(2026, 3, 10, 23, 0)));
    store.create(draft).unwrap();

    let occurrences = store.expand_all();
    assert_eq!(occurrences.len(), 5);
    for o in &occurrences {
        assert_eq!(o.start_time.with_timezone(&New_York).hour(), 9);
    }
    assert_eq!(occurrences[4].start_time, utc(2026, 3, 10, 13, 0));
}

#[test]
fn monthly_series_clamps_to_month_end() {
    let mut store = store_at(utc(2026, 1, 1, 0, 0));
    let start = utc(2026, 1, 31, 9, 0);
    let draft = AppointmentDraft::new("Rent", start, start + Duration::minutes(15))
        .with_recurrence(Recurrence::new(Frequency::Monthly).until(utc(2026, 4, 30, 23, 0)));
    store.create(draft).unwrap();

    let starts: Vec<DateTime<Utc>> = store.expand_all().iter().map(|o| o.start_time).collect();
    assert_eq!(
        starts,
        vec![
            utc(2026, 1, 31, 9, 0),
            utc(2026, 2, 28, 9, 0),
            utc(2026, 3, 31, 9, 0),
            utc(2026, 4, 30, 9, 0),
        ]
    );
}

#[test]
fn deleting_a_series_frees_every_slot() {
    let mut store = store_at(utc(2026, 3, 16, 10, 0));
    let start = utc(2026, 3, 17, 9, 0);
    let weekly = AppointmentDraft::new("1:1", start, start + Duration::hours(1))
        .with_recurrence(Recurrence::new(Frequency::Weekly));
    let id = store.book(weekly).unwrap();

    let later = utc(2026, 4, 14, 9, 30);
    assert!(!store.validate("Call", later, later + Duration::minutes(30)).is_empty());

    let occurrence_id = store.occurrences_on(later)[0].id().to_string();
    let source = store.resolve_source_id(&occurrence_id).unwrap();
    assert_eq!(source, id);
    store.delete(&source).unwrap();

    assert!(store.validate("Call", later, later + Duration::minutes(30)).is_empty());
}

#[test]
fn week_view_follows_configured_week_start() {
    let wednesday = utc(2026, 2, 18, 15, 0);
    let sunday_first = Calendar::utc().with_week_start(WeekStartDay::Sunday);
    let monday_first = Calendar::utc();

    assert_eq!(sunday_first.week_dates(wednesday).unwrap()[0], utc(2026, 2, 15, 0, 0));
    assert_eq!(monday_first.week_dates(wednesday).unwrap()[0], utc(2026, 2, 16, 0, 0));
}
