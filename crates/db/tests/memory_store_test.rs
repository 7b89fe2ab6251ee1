use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use mentorbook_core::errors::EngineError;
use mentorbook_core::ledger::Transition;
use mentorbook_core::models::booking::{BookingStatus, Party};
use mentorbook_core::store::EngineStore;
use mentorbook_db::MemoryStore;
use pretty_assertions::assert_eq;
use uuid::Uuid;

fn ten_oclock() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 9, 10, 0, 0).unwrap()
}

#[tokio::test]
async fn test_reserve_rejects_overlapping_window() {
    let store = MemoryStore::new();
    let mentor_id = Uuid::new_v4();
    let start = ten_oclock();

    store
        .reserve(mentor_id, Uuid::new_v4(), start, start + Duration::hours(1))
        .await
        .expect("first reservation should succeed");

    let err = store
        .reserve(
            mentor_id,
            Uuid::new_v4(),
            start + Duration::minutes(30),
            start + Duration::minutes(90),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SlotConflict(_)));
}

#[tokio::test]
async fn test_back_to_back_reservations_do_not_conflict() {
    let store = MemoryStore::new();
    let mentor_id = Uuid::new_v4();
    let start = ten_oclock();

    store
        .reserve(mentor_id, Uuid::new_v4(), start, start + Duration::hours(1))
        .await
        .unwrap();
    store
        .reserve(
            mentor_id,
            Uuid::new_v4(),
            start + Duration::hours(1),
            start + Duration::hours(2),
        )
        .await
        .expect("adjacent window should be free");

    let bookings = store.list_bookings(mentor_id).await.unwrap();
    assert_eq!(bookings.len(), 2);
    assert!(bookings[0].start_utc < bookings[1].start_utc);
}

#[tokio::test]
async fn test_mentors_do_not_share_a_ledger() {
    let store = MemoryStore::new();
    let start = ten_oclock();

    store
        .reserve(Uuid::new_v4(), Uuid::new_v4(), start, start + Duration::hours(1))
        .await
        .unwrap();
    store
        .reserve(Uuid::new_v4(), Uuid::new_v4(), start, start + Duration::hours(1))
        .await
        .expect("same window for a different mentor should be free");
}

#[tokio::test]
async fn test_concurrent_reservations_admit_exactly_one() {
    let store = Arc::new(MemoryStore::new());
    let mentor_id = Uuid::new_v4();
    let start = ten_oclock();
    let end = start + Duration::hours(1);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.reserve(mentor_id, Uuid::new_v4(), start, end).await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(EngineError::SlotConflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 15);
}

#[tokio::test]
async fn test_cancelled_booking_releases_its_window() {
    let store = MemoryStore::new();
    let mentor_id = Uuid::new_v4();
    let start = ten_oclock();

    let booking = store
        .reserve(mentor_id, Uuid::new_v4(), start, start + Duration::hours(1))
        .await
        .unwrap();
    let cancelled = store
        .transition(booking.id, 0, Transition::Cancel)
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    store
        .reserve(mentor_id, Uuid::new_v4(), start, start + Duration::hours(1))
        .await
        .expect("cancelled window should be reusable");
}

#[tokio::test]
async fn test_transition_enforces_version_guard() {
    let store = MemoryStore::new();
    let mentor_id = Uuid::new_v4();
    let start = ten_oclock();

    let booking = store
        .reserve(mentor_id, Uuid::new_v4(), start, start + Duration::hours(1))
        .await
        .unwrap();
    store
        .transition(booking.id, 0, Transition::Confirm { by: Party::Mentor })
        .await
        .unwrap();

    // a second writer still holding version 0 loses
    let err = store
        .transition(booking.id, 0, Transition::Cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::StaleBooking {
            supplied: 0,
            current: 1
        }
    ));
}

#[tokio::test]
async fn test_profile_creation_requires_timezone() {
    let store = MemoryStore::new();
    let err = store
        .set_weekly_rules(Uuid::new_v4(), None, vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation { field: "timezone", .. }));
}

#[tokio::test]
async fn test_profile_updates_keep_existing_timezone() {
    let store = MemoryStore::new();
    let mentor_id = Uuid::new_v4();

    store
        .set_weekly_rules(mentor_id, Some("Asia/Ulaanbaatar".to_string()), vec![])
        .await
        .unwrap();
    let profile = store.set_weekly_rules(mentor_id, None, vec![]).await.unwrap();
    assert_eq!(profile.timezone, "Asia/Ulaanbaatar");
}

#[tokio::test]
async fn test_override_and_active_flag_require_profile() {
    let store = MemoryStore::new();
    let missing = Uuid::new_v4();

    let date_override = mentorbook_core::models::availability::DateOverride {
        date: chrono::NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
        is_available: false,
        start_time: None,
        end_time: None,
        note: None,
    };
    let err = store.set_date_override(missing, date_override).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let err = store.set_profile_active(missing, false).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    assert!(store.get_profile(missing).await.unwrap().is_none());
    assert!(store.get_booking(Uuid::new_v4()).await.unwrap().is_none());
}
