// libs/scheduling-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use std::fmt;
use thiserror::Error;

use generation_cell::GenerationError;

/// Wall-clock format used on the wire, e.g. `09:00 AM`.
pub const CLOCK_TIME_FORMAT: &str = "%I:%M %p";

/// Booking length assumed when a booking record carries no duration.
pub const DEFAULT_BOOKING_DURATION_MINUTES: i64 = 60;

/// Parse a 12-hour clock string with an AM/PM marker at minute granularity.
pub fn parse_clock_time(raw: &str) -> Result<NaiveTime, SchedulingError> {
    NaiveTime::parse_from_str(raw.trim(), CLOCK_TIME_FORMAT)
        .map_err(|_| SchedulingError::InvalidTime(raw.to_string()))
}

pub fn format_clock_time(time: NaiveTime) -> String {
    time.format(CLOCK_TIME_FORMAT).to_string()
}

/// Serde adapter for `NaiveTime` fields rendered as `hh:mm AM`.
pub mod clock_time {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_clock_time(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_clock_time(&raw).map_err(de::Error::custom)
    }
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DaySpec {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    /// Every day of the week.
    Any,
}

impl DaySpec {
    pub fn matches(&self, weekday: Weekday) -> bool {
        *self == DaySpec::Any || *self == DaySpec::from(weekday)
    }
}

impl From<Weekday> for DaySpec {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DaySpec::Monday,
            Weekday::Tue => DaySpec::Tuesday,
            Weekday::Wed => DaySpec::Wednesday,
            Weekday::Thu => DaySpec::Thursday,
            Weekday::Fri => DaySpec::Friday,
            Weekday::Sat => DaySpec::Saturday,
            Weekday::Sun => DaySpec::Sunday,
        }
    }
}

impl fmt::Display for DaySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaySpec::Monday => write!(f, "Monday"),
            DaySpec::Tuesday => write!(f, "Tuesday"),
            DaySpec::Wednesday => write!(f, "Wednesday"),
            DaySpec::Thursday => write!(f, "Thursday"),
            DaySpec::Friday => write!(f, "Friday"),
            DaySpec::Saturday => write!(f, "Saturday"),
            DaySpec::Sunday => write!(f, "Sunday"),
            DaySpec::Any => write!(f, "Any"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Patient,
    Therapist,
    #[serde(alias = "robot")]
    Device,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Patient => write!(f, "patient"),
            ResourceKind::Therapist => write!(f, "therapist"),
            ResourceKind::Device => write!(f, "device"),
        }
    }
}

/// A recurring wall-clock window, `[start_time, end_time)` on the matching days.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeOfDayRange {
    pub day: DaySpec,
    #[serde(alias = "startTime")]
    pub start_time: String,
    #[serde(alias = "endTime")]
    pub end_time: String,
}

impl TimeOfDayRange {
    pub fn new(day: DaySpec, start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            day,
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceAvailability {
    pub resource_id: String,
    pub kind: ResourceKind,
    #[serde(default)]
    pub windows: Vec<TimeOfDayRange>,
}

impl ResourceAvailability {
    pub fn new(resource_id: impl Into<String>, kind: ResourceKind, windows: Vec<TimeOfDayRange>) -> Self {
        Self {
            resource_id: resource_id.into(),
            kind,
            windows,
        }
    }

    pub fn patient(resource_id: impl Into<String>, windows: Vec<TimeOfDayRange>) -> Self {
        Self::new(resource_id, ResourceKind::Patient, windows)
    }

    pub fn therapist(resource_id: impl Into<String>, windows: Vec<TimeOfDayRange>) -> Self {
        Self::new(resource_id, ResourceKind::Therapist, windows)
    }

    pub fn device(resource_id: impl Into<String>, windows: Vec<TimeOfDayRange>) -> Self {
        Self::new(resource_id, ResourceKind::Device, windows)
    }
}

// ==============================================================================
// BOOKING MODELS
// ==============================================================================

/// An already committed appointment. Every booking blocks the slots it overlaps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Booking {
    pub id: Uuid,
    pub start: NaiveDateTime,
    pub duration_minutes: i64,
    pub patient_id: Option<String>,
    pub therapist_id: Option<String>,
    pub device_id: Option<String>,
}

impl Booking {
    pub fn new(start: NaiveDateTime, duration_minutes: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            duration_minutes,
            patient_id: None,
            therapist_id: None,
            device_id: None,
        }
    }

    /// Fails with `InvalidBooking` when the end is not a representable instant.
    pub fn end(&self) -> Result<NaiveDateTime, SchedulingError> {
        Duration::try_minutes(self.duration_minutes)
            .and_then(|duration| self.start.checked_add_signed(duration))
            .ok_or_else(|| SchedulingError::InvalidBooking {
                id: self.id,
                reason: format!("duration of {} minutes is out of range", self.duration_minutes),
            })
    }
}

/// Booking as it is exchanged with callers: a calendar date plus a clock time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingRecord {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default, alias = "patientName", alias = "patient_name")]
    pub patient_id: Option<String>,
    #[serde(default, alias = "therapistId")]
    pub therapist_id: Option<String>,
    #[serde(default, alias = "deviceId", alias = "robotId")]
    pub device_id: Option<String>,
}

impl BookingRecord {
    pub fn to_booking(&self) -> Result<Booking, SchedulingError> {
        let time = parse_clock_time(&self.time)?;
        let id = self.id.unwrap_or_else(Uuid::new_v4);
        let duration_minutes = self.duration.unwrap_or(DEFAULT_BOOKING_DURATION_MINUTES);

        if duration_minutes <= 0 {
            return Err(SchedulingError::InvalidBooking {
                id,
                reason: format!("duration must be positive, got {} minutes", duration_minutes),
            });
        }

        let booking = Booking {
            id,
            start: self.date.and_time(time),
            duration_minutes,
            patient_id: self.patient_id.clone(),
            therapist_id: self.therapist_id.clone(),
            device_id: self.device_id.clone(),
        };
        booking.end()?;

        Ok(booking)
    }
}

pub fn bookings_from_records(records: &[BookingRecord]) -> Result<Vec<Booking>, SchedulingError> {
    records.iter().map(BookingRecord::to_booking).collect()
}

// ==============================================================================
// SEARCH MODELS
// ==============================================================================

/// Inclusive calendar-date window searched day by day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SearchRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateSlot {
    pub date: NaiveDate,
    #[serde(with = "clock_time")]
    pub start_time: NaiveTime,
    #[serde(with = "clock_time")]
    pub end_time: NaiveTime,
}

impl CandidateSlot {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.date.and_time(self.end_time)
    }

    pub fn overlaps(&self, booking: &Booking) -> bool {
        // an unrepresentable end lies past any slot
        let ends_after_start = booking.end().map_or(true, |end| self.starts_at() < end);
        ends_after_start && booking.start < self.ends_at()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub condition: Option<String>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSearchRequest {
    pub patient_availability: ResourceAvailability,
    pub therapist_availability: ResourceAvailability,
    #[serde(alias = "robot_availability")]
    pub device_availability: ResourceAvailability,
    #[serde(default, alias = "existing_appointments")]
    pub existing_bookings: Vec<BookingRecord>,
    #[serde(alias = "session_duration")]
    pub session_duration_minutes: i64,
    #[serde(alias = "date_range")]
    pub search_range: SearchRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSlotSearchRequest {
    pub therapist_id: String,
    #[serde(alias = "robot_id")]
    pub device_id: String,
    pub session_duration_minutes: i64,
    pub search_range: SearchRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOptimizerRequest {
    pub patient_name: String,
    pub patient_availability: ResourceAvailability,
    pub therapist_availability: ResourceAvailability,
    #[serde(alias = "robot_availability")]
    pub device_availability: ResourceAvailability,
    #[serde(default, alias = "existing_appointments")]
    pub existing_bookings: Vec<BookingRecord>,
    pub session_duration_minutes: i64,
    pub search_range: SearchRange,
    pub scheduling_goal: String,
    #[serde(default)]
    pub constraints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestedSession {
    pub patient_name: String,
    pub therapist_id: String,
    pub date: NaiveDate,
    #[serde(with = "clock_time")]
    pub start_time: NaiveTime,
    #[serde(with = "clock_time")]
    pub end_time: NaiveTime,
}

impl SuggestedSession {
    pub fn slot(&self) -> CandidateSlot {
        CandidateSlot {
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleSuggestion {
    pub suggested_slots: Vec<SuggestedSession>,
    pub justification: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Invalid time '{0}': expected hh:mm AM/PM")]
    InvalidTime(String),

    #[error("Invalid {kind} availability for '{resource_id}': {start} must be before {end}")]
    InvalidWindow {
        kind: ResourceKind,
        resource_id: String,
        start: String,
        end: String,
    },

    #[error("Session duration must be positive, got {0} minutes")]
    InvalidDuration(i64),

    #[error("Search range start {start} is after end {end}")]
    InvalidSearchRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid booking {id}: {reason}")]
    InvalidBooking { id: Uuid, reason: String },

    #[error("{kind} '{id}' not found")]
    ResourceNotFound { kind: ResourceKind, id: String },

    #[error("Scheduling data source error: {0}")]
    DataSource(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Suggested session is not an available slot: {0}")]
    InvalidSuggestion(String),
}
