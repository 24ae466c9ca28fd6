use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use provider_cell::models::{
    AvailabilityException, BookedTime, ExceptionType, Provider, ProviderRole,
    WeeklyAvailability,
};
use provider_cell::services::availability::{
    day_of_week_index, generate_slots_for_day, slot_starts_in_window, windows_for_day,
};

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn test_provider() -> Provider {
    Provider {
        id: Uuid::new_v4(),
        first_name: "Dana".to_string(),
        last_name: "Whitfield".to_string(),
        email: "dana.whitfield@example.com".to_string(),
        role: ProviderRole::Psychiatrist,
        npi: Some("1234567890".to_string()),
        is_active: true,
        is_bookable: true,
        accepts_new_patients: true,
        offers_telehealth: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn weekly_block(provider_id: Uuid, day_of_week: i32, start: NaiveTime, end: NaiveTime) -> WeeklyAvailability {
    WeeklyAvailability {
        id: Uuid::new_v4(),
        provider_id,
        day_of_week,
        start_time: start,
        end_time: end,
        is_recurring: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn exception(
    provider_id: Uuid,
    date: NaiveDate,
    exception_type: ExceptionType,
    window: Option<(NaiveTime, NaiveTime)>,
) -> AvailabilityException {
    AvailabilityException {
        id: Uuid::new_v4(),
        provider_id,
        exception_date: date,
        exception_type,
        start_time: window.map(|(s, _)| s),
        end_time: window.map(|(_, e)| e),
        note: None,
        created_at: Utc::now(),
    }
}

// 2025-06-02 is a Monday
const MONDAY: &str = "2025-06-02";

fn monday() -> NaiveDate {
    NaiveDate::parse_from_str(MONDAY, "%Y-%m-%d").unwrap()
}

#[test]
fn test_day_of_week_index_is_sunday_based() {
    assert_eq!(day_of_week_index(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()), 0); // Sunday
    assert_eq!(day_of_week_index(monday()), 1);
    assert_eq!(day_of_week_index(NaiveDate::from_ymd_opt(2025, 6, 7).unwrap()), 6); // Saturday
}

#[test]
fn test_slot_stepping_uses_duration_plus_buffer() {
    let starts = slot_starts_in_window(time(9, 0), time(11, 0), 45, 15);
    assert_eq!(starts, vec![time(9, 0), time(10, 0)]);
}

#[test]
fn test_slot_end_must_fit_inside_window() {
    // 9:00-10:30 with 45+15 stepping: a 10:00 slot would end at 10:45,
    // past the window, so only 9:00 is emitted.
    let starts = slot_starts_in_window(time(9, 0), time(10, 30), 45, 15);
    assert_eq!(starts, vec![time(9, 0)]);

    // An exactly-fitting final slot is kept.
    let starts = slot_starts_in_window(time(9, 0), time(10, 45), 45, 15);
    assert_eq!(starts, vec![time(9, 0), time(10, 0)]);
}

#[test]
fn test_empty_or_inverted_window_yields_no_slots() {
    assert!(slot_starts_in_window(time(9, 0), time(9, 0), 45, 15).is_empty());
    assert!(slot_starts_in_window(time(10, 0), time(9, 0), 45, 15).is_empty());
    assert!(slot_starts_in_window(time(9, 0), time(17, 0), 0, 15).is_empty());
}

#[test]
fn test_vacation_suppresses_the_whole_day() {
    let provider = test_provider();
    let weekly = vec![weekly_block(provider.id, 1, time(9, 0), time(17, 0))];

    let without_exception = generate_slots_for_day(
        &provider, monday(), &weekly, &[], &[], 45, 15,
    );
    assert!(without_exception.len() > 0);

    for suppressing in [ExceptionType::Vacation, ExceptionType::Unavailable] {
        let exceptions = vec![exception(provider.id, monday(), suppressing, None)];
        let slots = generate_slots_for_day(
            &provider, monday(), &weekly, &exceptions, &[], 45, 15,
        );
        assert!(slots.is_empty(), "{:?} should suppress the day", suppressing);
    }
}

#[test]
fn test_custom_hours_replace_the_weekly_template() {
    let provider = test_provider();
    let weekly = vec![weekly_block(provider.id, 1, time(9, 0), time(17, 0))];
    let exceptions = vec![exception(
        provider.id,
        monday(),
        ExceptionType::CustomHours,
        Some((time(13, 0), time(15, 0))),
    )];

    let slots = generate_slots_for_day(&provider, monday(), &weekly, &exceptions, &[], 45, 15);
    let times: Vec<NaiveTime> = slots.iter().map(|s| s.time).collect();
    assert_eq!(times, vec![time(13, 0), time(14, 0)]);
}

#[test]
fn test_partial_block_drops_slots_starting_inside_the_block() {
    let provider = test_provider();
    let weekly = vec![weekly_block(provider.id, 1, time(9, 0), time(13, 0))];
    // Blocked range [10:00, 12:00)
    let exceptions = vec![exception(
        provider.id,
        monday(),
        ExceptionType::PartialBlock,
        Some((time(10, 0), time(12, 0))),
    )];

    let slots = generate_slots_for_day(&provider, monday(), &weekly, &exceptions, &[], 45, 15);
    let times: Vec<NaiveTime> = slots.iter().map(|s| s.time).collect();

    // 9:00 survives, 10:00 and 11:00 start inside the block, 12:00 is the
    // half-open boundary and survives.
    assert_eq!(times, vec![time(9, 0), time(12, 0)]);
    for t in &times {
        assert!(!(*t >= time(10, 0) && *t < time(12, 0)));
    }
}

#[test]
fn test_booked_time_removes_only_the_exact_start() {
    let provider = test_provider();
    let weekly = vec![weekly_block(provider.id, 1, time(9, 0), time(12, 0))];
    let booked = vec![BookedTime {
        appointment_date: monday(),
        start_time: time(10, 0),
        duration_minutes: 45,
    }];

    let slots = generate_slots_for_day(&provider, monday(), &weekly, &[], &booked, 45, 15);
    let times: Vec<NaiveTime> = slots.iter().map(|s| s.time).collect();
    assert_eq!(times, vec![time(9, 0), time(11, 0)]);
}

#[test]
fn test_offset_booking_does_not_remove_overlapping_slot() {
    // An appointment at 10:01 overlaps the 10:00 slot but does not share its
    // start time, so the 10:00 slot is still offered. This pins the current
    // exact-start collision rule.
    let provider = test_provider();
    let weekly = vec![weekly_block(provider.id, 1, time(9, 0), time(12, 0))];
    let booked = vec![BookedTime {
        appointment_date: monday(),
        start_time: NaiveTime::from_hms_opt(10, 1, 0).unwrap(),
        duration_minutes: 45,
    }];

    let slots = generate_slots_for_day(&provider, monday(), &weekly, &[], &booked, 45, 15);
    let times: Vec<NaiveTime> = slots.iter().map(|s| s.time).collect();
    assert!(times.contains(&time(10, 0)));
}

#[test]
fn test_booking_on_another_day_is_ignored() {
    let provider = test_provider();
    let weekly = vec![weekly_block(provider.id, 1, time(9, 0), time(11, 0))];
    let booked = vec![BookedTime {
        appointment_date: monday().succ_opt().unwrap(),
        start_time: time(9, 0),
        duration_minutes: 45,
    }];

    let slots = generate_slots_for_day(&provider, monday(), &weekly, &[], &booked, 45, 15);
    let times: Vec<NaiveTime> = slots.iter().map(|s| s.time).collect();
    assert_eq!(times, vec![time(9, 0), time(10, 0)]);
}

#[test]
fn test_no_weekly_template_for_weekday_yields_no_slots() {
    let provider = test_provider();
    // Template only covers Tuesday (2); asking about Monday gives nothing.
    let weekly = vec![weekly_block(provider.id, 2, time(9, 0), time(17, 0))];

    let slots = generate_slots_for_day(&provider, monday(), &weekly, &[], &[], 45, 15);
    assert!(slots.is_empty());
}

#[test]
fn test_multiple_weekly_blocks_are_merged_and_sorted() {
    let provider = test_provider();
    let weekly = vec![
        weekly_block(provider.id, 1, time(13, 0), time(15, 0)),
        weekly_block(provider.id, 1, time(9, 0), time(11, 0)),
    ];

    let slots = generate_slots_for_day(&provider, monday(), &weekly, &[], &[], 45, 15);
    let times: Vec<NaiveTime> = slots.iter().map(|s| s.time).collect();
    assert_eq!(times, vec![time(9, 0), time(10, 0), time(13, 0), time(14, 0)]);
}

#[test]
fn test_windows_ignore_exceptions_for_other_dates() {
    let provider = test_provider();
    let weekly = vec![weekly_block(provider.id, 1, time(9, 0), time(11, 0))];
    let exceptions = vec![exception(
        provider.id,
        monday().succ_opt().unwrap(),
        ExceptionType::Vacation,
        None,
    )];

    let windows = windows_for_day(monday(), &weekly, &exceptions);
    assert_eq!(windows, vec![(time(9, 0), time(11, 0))]);
}

#[test]
fn test_recurring_change_behaves_like_custom_hours() {
    let provider = test_provider();
    let weekly = vec![weekly_block(provider.id, 1, time(9, 0), time(17, 0))];
    let exceptions = vec![exception(
        provider.id,
        monday(),
        ExceptionType::RecurringChange,
        Some((time(8, 0), time(10, 0))),
    )];

    let slots = generate_slots_for_day(&provider, monday(), &weekly, &exceptions, &[], 45, 15);
    let times: Vec<NaiveTime> = slots.iter().map(|s| s.time).collect();
    assert_eq!(times, vec![time(8, 0), time(9, 0)]);
}
