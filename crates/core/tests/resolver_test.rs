use chrono::{NaiveDate, TimeZone, Utc};
use mentorbook_core::models::availability::{AvailabilityProfile, DateOverride, WeeklyRule};
use mentorbook_core::models::slot::ResolvedSlot;
use mentorbook_core::resolver::{resolve, window_is_offerable};
use pretty_assertions::assert_eq;
use uuid::Uuid;

fn profile(timezone: &str, rules: Vec<WeeklyRule>) -> AvailabilityProfile {
    let mut profile = AvailabilityProfile::new(Uuid::new_v4(), timezone.to_string(), Utc::now());
    profile.weekly_rules = rules;
    profile
}

fn rule(day_of_week: u8, start: &str, end: &str, is_available: bool) -> WeeklyRule {
    WeeklyRule {
        day_of_week,
        start_time: start.parse().unwrap(),
        end_time: end.parse().unwrap(),
        is_available,
    }
}

fn collect(
    profile: &AvailabilityProfile,
    range_start: chrono::DateTime<Utc>,
    range_end: chrono::DateTime<Utc>,
) -> Vec<ResolvedSlot> {
    resolve(profile, range_start, range_end)
        .expect("profile timezone should be valid")
        .collect()
}

// 2026-03-09 is a Monday.
#[test]
fn test_ulaanbaatar_monday_resolves_to_utc_offset_window() {
    let profile = profile("Asia/Ulaanbaatar", vec![rule(1, "09:00", "12:00", true)]);

    let range_start = Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap();
    let range_end = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
    let slots = collect(&profile, range_start, range_end);

    // mentor local 09:00-12:00 is 01:00-04:00 UTC (+08:00, no DST)
    assert_eq!(
        slots,
        vec![ResolvedSlot {
            start_utc: Utc.with_ymd_and_hms(2026, 3, 9, 1, 0, 0).unwrap(),
            end_utc: Utc.with_ymd_and_hms(2026, 3, 9, 4, 0, 0).unwrap(),
        }]
    );
}

#[test]
fn test_override_supersedes_weekly_pattern() {
    let mut profile = profile("UTC", vec![rule(1, "09:00", "17:00", true)]);
    let monday = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
    profile.date_overrides.insert(
        monday,
        DateOverride {
            date: monday,
            is_available: false,
            start_time: None,
            end_time: None,
            note: Some("travelling".to_string()),
        },
    );

    let range_start = Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap();
    let range_end = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
    assert_eq!(collect(&profile, range_start, range_end), vec![]);

    // the following Monday is untouched by the override
    let next_start = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
    let next_end = Utc.with_ymd_and_hms(2026, 3, 17, 0, 0, 0).unwrap();
    assert_eq!(collect(&profile, next_start, next_end).len(), 1);
}

#[test]
fn test_available_override_replaces_rather_than_merges() {
    let mut profile = profile("UTC", vec![rule(1, "09:00", "17:00", true)]);
    let monday = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
    profile.date_overrides.insert(
        monday,
        DateOverride {
            date: monday,
            is_available: true,
            start_time: Some("19:00".parse().unwrap()),
            end_time: Some("21:00".parse().unwrap()),
            note: None,
        },
    );

    let range_start = Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap();
    let range_end = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
    let slots = collect(&profile, range_start, range_end);

    // exactly the override's sub-range; the 09:00-17:00 pattern is not mixed in
    assert_eq!(
        slots,
        vec![ResolvedSlot {
            start_utc: Utc.with_ymd_and_hms(2026, 3, 9, 19, 0, 0).unwrap(),
            end_utc: Utc.with_ymd_and_hms(2026, 3, 9, 21, 0, 0).unwrap(),
        }]
    );
}

#[test]
fn test_blackout_rules_subtract_from_availability() {
    let profile = profile(
        "UTC",
        vec![
            rule(1, "09:00", "13:00", true),
            rule(1, "11:00", "17:00", true),
            rule(1, "12:00", "13:00", false),
        ],
    );

    let range_start = Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap();
    let range_end = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
    let slots = collect(&profile, range_start, range_end);

    assert_eq!(
        slots,
        vec![
            ResolvedSlot {
                start_utc: Utc.with_ymd_and_hms(2026, 3, 9, 9, 0, 0).unwrap(),
                end_utc: Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap(),
            },
            ResolvedSlot {
                start_utc: Utc.with_ymd_and_hms(2026, 3, 9, 13, 0, 0).unwrap(),
                end_utc: Utc.with_ymd_and_hms(2026, 3, 9, 17, 0, 0).unwrap(),
            },
        ]
    );
}

// America/New_York springs forward on 2026-03-08: 02:00 EST jumps to 03:00 EDT.
#[test]
fn test_spring_forward_shrinks_local_interval() {
    let profile = profile("America/New_York", vec![rule(0, "01:00", "03:00", true)]);

    let range_start = Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap();
    let range_end = Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap();
    let slots = collect(&profile, range_start, range_end);

    // 01:00 EST = 06:00Z, 03:00 EDT = 07:00Z: one UTC hour, not two
    assert_eq!(
        slots,
        vec![ResolvedSlot {
            start_utc: Utc.with_ymd_and_hms(2026, 3, 8, 6, 0, 0).unwrap(),
            end_utc: Utc.with_ymd_and_hms(2026, 3, 8, 7, 0, 0).unwrap(),
        }]
    );

    // the Sunday after the transition gets the full two EDT hours
    let next_start = Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap();
    let next_end = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
    let slots = collect(&profile, next_start, next_end);
    assert_eq!(
        slots,
        vec![ResolvedSlot {
            start_utc: Utc.with_ymd_and_hms(2026, 3, 15, 5, 0, 0).unwrap(),
            end_utc: Utc.with_ymd_and_hms(2026, 3, 15, 7, 0, 0).unwrap(),
        }]
    );
}

#[test]
fn test_contiguous_days_merge_in_utc() {
    let profile = profile(
        "UTC",
        vec![rule(1, "23:30", "24:00", true), rule(2, "00:00", "01:00", true)],
    );

    let range_start = Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap();
    let range_end = Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap();
    let slots = collect(&profile, range_start, range_end);

    assert_eq!(
        slots,
        vec![ResolvedSlot {
            start_utc: Utc.with_ymd_and_hms(2026, 3, 9, 23, 30, 0).unwrap(),
            end_utc: Utc.with_ymd_and_hms(2026, 3, 10, 1, 0, 0).unwrap(),
        }]
    );
}

#[test]
fn test_range_outside_coverage_is_empty_not_error() {
    let profile = profile("UTC", vec![rule(1, "09:00", "12:00", true)]);

    // a Wednesday-to-Friday range never touches the Monday rule
    let range_start = Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap();
    let range_end = Utc.with_ymd_and_hms(2026, 3, 13, 0, 0, 0).unwrap();
    assert_eq!(collect(&profile, range_start, range_end), vec![]);

    // an inverted range is also just empty
    assert_eq!(collect(&profile, range_end, range_start), vec![]);
}

#[test]
fn test_slots_clamped_to_query_range() {
    let profile = profile("UTC", vec![rule(1, "09:00", "12:00", true)]);

    let range_start = Utc.with_ymd_and_hms(2026, 3, 9, 10, 0, 0).unwrap();
    let range_end = Utc.with_ymd_and_hms(2026, 3, 9, 11, 0, 0).unwrap();
    let slots = collect(&profile, range_start, range_end);

    assert_eq!(
        slots,
        vec![ResolvedSlot {
            start_utc: range_start,
            end_utc: range_end,
        }]
    );
}

#[test]
fn test_resolution_is_idempotent() {
    let mut profile = profile(
        "America/New_York",
        vec![
            rule(1, "09:00", "17:00", true),
            rule(1, "12:00", "13:00", false),
            rule(3, "10:00", "14:00", true),
        ],
    );
    let wednesday = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
    profile.date_overrides.insert(
        wednesday,
        DateOverride {
            date: wednesday,
            is_available: true,
            start_time: Some("08:00".parse().unwrap()),
            end_time: Some("09:30".parse().unwrap()),
            note: None,
        },
    );

    let range_start = Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap();
    let range_end = Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap();

    let first = collect(&profile, range_start, range_end);
    let second = collect(&profile, range_start, range_end);
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn test_window_is_offerable_requires_full_containment() {
    let profile = profile("UTC", vec![rule(1, "09:00", "12:00", true)]);

    let ten = Utc.with_ymd_and_hms(2026, 3, 9, 10, 0, 0).unwrap();
    let eleven = Utc.with_ymd_and_hms(2026, 3, 9, 11, 0, 0).unwrap();
    let one_pm = Utc.with_ymd_and_hms(2026, 3, 9, 13, 0, 0).unwrap();

    assert!(window_is_offerable(&profile, ten, eleven).unwrap());
    // spills past the end of the window: partially contained is not enough
    assert!(!window_is_offerable(&profile, eleven, one_pm).unwrap());
    // degenerate window
    assert!(!window_is_offerable(&profile, ten, ten).unwrap());
}

#[test]
fn test_invalid_profile_timezone_is_rejected() {
    let profile = profile("Not/AZone", vec![rule(1, "09:00", "12:00", true)]);
    let range_start = Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap();
    let range_end = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
    assert!(resolve(&profile, range_start, range_end).is_err());
}
