// libs/scheduling-cell/tests/data_source_test.rs

use std::io::Write;

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate};
use serde_json::json;

use scheduling_cell::models::{ResourceKind, SchedulingError, SearchRange};
use scheduling_cell::services::{find_available_slots, InMemoryDataSource, SchedulingDataSource};

fn today() -> NaiveDate {
    // a Sunday, so the sample bookings land on Monday and Tuesday
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

fn fixture_json() -> String {
    json!({
        "patients": [
            { "id": "maria-lopez", "name": "Maria Lopez", "condition": "ACL Reconstruction" }
        ],
        "availabilities": [
            {
                "resource_id": "maria-lopez",
                "kind": "patient",
                "windows": [{ "day": "Friday", "start_time": "01:00 PM", "end_time": "03:00 PM" }]
            },
            {
                "resource_id": "dr-chen",
                "kind": "therapist",
                "windows": [{ "day": "Any", "start_time": "09:00 AM", "end_time": "05:00 PM" }]
            },
            {
                "resource_id": "gait-trainer-2",
                "kind": "robot",
                "windows": [{ "day": "Any", "start_time": "07:00 AM", "end_time": "07:00 PM" }]
            }
        ],
        "bookings": [
            { "date": "2025-06-20", "time": "01:30 PM", "duration": 30, "therapistId": "dr-chen" }
        ]
    })
    .to_string()
}

#[tokio::test]
async fn test_sample_data_lists_clinic_patients() {
    let source = InMemoryDataSource::sample(today());

    let patients = source.load_patients().await.unwrap();

    let names: Vec<&str> = patients.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["John Doe", "Jane Smith", "Samuel Green"]);
}

#[tokio::test]
async fn test_sample_availability_is_looked_up_by_kind_and_id() {
    let source = InMemoryDataSource::sample(today());

    let therapist = source.load_availability(ResourceKind::Therapist, "dr-roberts").await.unwrap();
    assert_eq!(therapist.windows.len(), 1);

    let wrong_kind = source.load_availability(ResourceKind::Patient, "dr-roberts").await;
    assert_matches!(
        wrong_kind,
        Err(SchedulingError::ResourceNotFound { kind: ResourceKind::Patient, ref id }) if id == "dr-roberts"
    );
}

#[tokio::test]
async fn test_bookings_are_filtered_to_search_range() {
    let source = InMemoryDataSource::sample(today());

    let tomorrow = today() + Duration::days(1);
    let only_tomorrow = source.load_bookings(&SearchRange::single_day(tomorrow)).await.unwrap();
    assert_eq!(only_tomorrow.len(), 1);
    assert_eq!(only_tomorrow[0].duration_minutes, 60);

    let whole_week = SearchRange::new(today(), today() + Duration::days(7));
    assert_eq!(source.load_bookings(&whole_week).await.unwrap().len(), 2);

    let last_week = SearchRange::new(today() - Duration::days(7), today() - Duration::days(1));
    assert!(source.load_bookings(&last_week).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sample_week_for_john_doe_respects_booking() {
    let source = InMemoryDataSource::sample(today());
    let range = SearchRange::new(today(), today() + Duration::days(7));

    let patient = source.load_availability(ResourceKind::Patient, "john-doe").await.unwrap();
    let therapist = source.load_availability(ResourceKind::Therapist, "dr-roberts").await.unwrap();
    let device = source.load_availability(ResourceKind::Device, "robot-arm-01").await.unwrap();
    let bookings = source.load_bookings(&range).await.unwrap();

    let slots = find_available_slots(&patient, &therapist, &device, &bookings, 45, &range).unwrap();

    // Monday and Wednesday mornings, ten 45-minute starts each
    assert_eq!(slots.len(), 20);
    assert!(slots.iter().all(|slot| bookings.iter().all(|b| !slot.overlaps(b))));
}

#[tokio::test]
async fn test_fixture_json_is_loaded() {
    let source = InMemoryDataSource::from_json(&fixture_json()).unwrap();

    let device = source.load_availability(ResourceKind::Device, "gait-trainer-2").await.unwrap();
    assert_eq!(device.resource_id, "gait-trainer-2");

    let friday = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();
    let bookings = source.load_bookings(&SearchRange::single_day(friday)).await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].therapist_id.as_deref(), Some("dr-chen"));
}

#[tokio::test]
async fn test_fixture_file_is_loaded_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(fixture_json().as_bytes()).unwrap();

    let source = InMemoryDataSource::from_path(file.path()).unwrap();

    let patients = source.load_patients().await.unwrap();
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0].condition.as_deref(), Some("ACL Reconstruction"));
}

#[test]
fn test_missing_fixture_file_is_a_data_source_error() {
    let result = InMemoryDataSource::from_path("/nonexistent/scheduling.json");

    assert_matches!(result, Err(SchedulingError::DataSource(_)));
}

#[test]
fn test_fixture_with_bad_booking_time_is_rejected() {
    let raw = json!({
        "bookings": [{ "date": "2025-06-20", "time": "25:00 PM" }]
    })
    .to_string();

    assert_matches!(InMemoryDataSource::from_json(&raw), Err(SchedulingError::InvalidTime(_)));
}

#[test]
fn test_fixture_with_overflowing_booking_duration_is_rejected() {
    let raw = json!({
        "bookings": [{ "date": "2025-06-20", "time": "09:00 AM", "duration": 1_000_000_000_000i64 }]
    })
    .to_string();

    assert_matches!(InMemoryDataSource::from_json(&raw), Err(SchedulingError::InvalidBooking { .. }));
}
