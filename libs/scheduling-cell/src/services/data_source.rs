// libs/scheduling-cell/src/services/data_source.rs
use std::path::Path;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    bookings_from_records, Booking, BookingRecord, DaySpec, PatientSummary, ResourceAvailability,
    ResourceKind, SchedulingError, SearchRange, TimeOfDayRange,
};

/// Where patients, availability and committed bookings come from.
#[async_trait]
pub trait SchedulingDataSource: Send + Sync {
    async fn load_patients(&self) -> Result<Vec<PatientSummary>, SchedulingError>;

    async fn load_availability(
        &self,
        kind: ResourceKind,
        resource_id: &str,
    ) -> Result<ResourceAvailability, SchedulingError>;

    /// Bookings that touch any day of `range`.
    async fn load_bookings(&self, range: &SearchRange) -> Result<Vec<Booking>, SchedulingError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulingFixture {
    #[serde(default)]
    pub patients: Vec<PatientSummary>,
    #[serde(default)]
    pub availabilities: Vec<ResourceAvailability>,
    #[serde(default)]
    pub bookings: Vec<BookingRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    patients: Vec<PatientSummary>,
    availabilities: Vec<ResourceAvailability>,
    bookings: Vec<Booking>,
}

impl InMemoryDataSource {
    pub fn new(
        patients: Vec<PatientSummary>,
        availabilities: Vec<ResourceAvailability>,
        bookings: Vec<Booking>,
    ) -> Self {
        Self { patients, availabilities, bookings }
    }

    pub fn from_fixture(fixture: SchedulingFixture) -> Result<Self, SchedulingError> {
        let bookings = bookings_from_records(&fixture.bookings)?;
        Ok(Self::new(fixture.patients, fixture.availabilities, bookings))
    }

    pub fn from_json(raw: &str) -> Result<Self, SchedulingError> {
        let fixture: SchedulingFixture = serde_json::from_str(raw)
            .map_err(|e| SchedulingError::DataSource(format!("Invalid scheduling fixture: {}", e)))?;
        Self::from_fixture(fixture)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchedulingError> {
        let path = path.as_ref();
        info!("Loading scheduling fixture from {}", path.display());

        let raw = std::fs::read_to_string(path).map_err(|e| {
            SchedulingError::DataSource(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    /// The clinic's sample week, with bookings placed relative to `today`.
    pub fn sample(today: NaiveDate) -> Self {
        let patients = vec![
            sample_patient("john-doe", "John Doe", "Post-Stroke Hemiparesis"),
            sample_patient("jane-smith", "Jane Smith", "Rotator Cuff Tear (Post-operative)"),
            sample_patient("samuel-green", "Samuel Green", "Arthritis in Knee"),
        ];

        let availabilities = vec![
            ResourceAvailability::patient("john-doe", vec![
                TimeOfDayRange::new(DaySpec::Monday, "09:00 AM", "12:00 PM"),
                TimeOfDayRange::new(DaySpec::Wednesday, "09:00 AM", "12:00 PM"),
            ]),
            ResourceAvailability::patient("jane-smith", vec![
                TimeOfDayRange::new(DaySpec::Any, "10:00 AM", "04:00 PM"),
            ]),
            ResourceAvailability::therapist("dr-roberts", vec![
                TimeOfDayRange::new(DaySpec::Any, "08:00 AM", "05:00 PM"),
            ]),
            ResourceAvailability::device("robot-arm-01", vec![
                TimeOfDayRange::new(DaySpec::Any, "08:00 AM", "06:00 PM"),
            ]),
        ];

        let bookings = vec![
            sample_booking(today + Duration::days(1), (13, 0), 60, "Emily Brown"),
            sample_booking(today + Duration::days(2), (14, 0), 30, "Samuel Green"),
        ];

        Self::new(patients, availabilities, bookings)
    }
}

fn sample_patient(id: &str, name: &str, condition: &str) -> PatientSummary {
    PatientSummary {
        id: id.to_string(),
        name: name.to_string(),
        condition: Some(condition.to_string()),
    }
}

fn sample_booking(date: NaiveDate, at: (u32, u32), duration_minutes: i64, patient: &str) -> Booking {
    let time = NaiveTime::from_hms_opt(at.0, at.1, 0).unwrap_or_default();
    Booking {
        id: Uuid::new_v4(),
        start: date.and_time(time),
        duration_minutes,
        patient_id: Some(patient.to_string()),
        therapist_id: Some("dr-roberts".to_string()),
        device_id: Some("robot-arm-01".to_string()),
    }
}

#[async_trait]
impl SchedulingDataSource for InMemoryDataSource {
    async fn load_patients(&self) -> Result<Vec<PatientSummary>, SchedulingError> {
        Ok(self.patients.clone())
    }

    async fn load_availability(
        &self,
        kind: ResourceKind,
        resource_id: &str,
    ) -> Result<ResourceAvailability, SchedulingError> {
        debug!("Loading {} availability for {}", kind, resource_id);

        self.availabilities.iter()
            .find(|availability| availability.kind == kind && availability.resource_id == resource_id)
            .cloned()
            .ok_or_else(|| SchedulingError::ResourceNotFound {
                kind,
                id: resource_id.to_string(),
            })
    }

    async fn load_bookings(&self, range: &SearchRange) -> Result<Vec<Booking>, SchedulingError> {
        Ok(self.bookings.iter()
            .filter(|booking| {
                booking.start.date() <= range.end
                    && booking.end().map_or(true, |end| end.date() >= range.start)
            })
            .cloned()
            .collect())
    }
}
