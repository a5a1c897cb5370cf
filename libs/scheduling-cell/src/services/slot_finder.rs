// libs/scheduling-cell/src/services/slot_finder.rs
use std::collections::HashSet;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::models::{
    parse_clock_time, Booking, CandidateSlot, DaySpec, ResourceAvailability, SchedulingError,
    SearchRange,
};

pub const DEFAULT_STEP_MINUTES: i64 = 15;
pub const MAX_STEP_MINUTES: i64 = 24 * 60;

/// How the per-day windows of the three resources are combined before
/// candidate starts are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntersectionStrategy {
    /// One window per day: latest start and earliest end over every interval
    /// of every resource. A resource with disjoint windows usually collapses
    /// the day to nothing.
    #[default]
    Envelope,
    /// Union each resource's intervals, then intersect the three unions.
    MergedSweep,
}

impl FromStr for IntersectionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "envelope" => Ok(IntersectionStrategy::Envelope),
            "merged" | "merged_sweep" | "merged-sweep" => Ok(IntersectionStrategy::MergedSweep),
            other => Err(format!("unknown intersection strategy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotFinderConfig {
    pub step_minutes: i64,
    pub strategy: IntersectionStrategy,
}

impl Default for SlotFinderConfig {
    fn default() -> Self {
        Self {
            step_minutes: DEFAULT_STEP_MINUTES,
            strategy: IntersectionStrategy::Envelope,
        }
    }
}

impl SlotFinderConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        let strategy = config.slot_intersection_strategy.parse().unwrap_or_else(|e| {
            warn!("{}, falling back to envelope", e);
            IntersectionStrategy::Envelope
        });

        let step_minutes = if (1..=MAX_STEP_MINUTES).contains(&config.slot_step_minutes) {
            config.slot_step_minutes
        } else {
            warn!(
                "Slot step of {} minutes is outside 1..={}, falling back to {}",
                config.slot_step_minutes, MAX_STEP_MINUTES, DEFAULT_STEP_MINUTES
            );
            DEFAULT_STEP_MINUTES
        };

        Self { step_minutes, strategy }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Interval {
    /// Both bounds inclusive.
    fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }
}

#[derive(Debug, Clone, Copy)]
struct ParsedWindow {
    day: DaySpec,
    start: NaiveTime,
    end: NaiveTime,
}

/// Finds session slots where a patient, a therapist and a device are all free.
#[derive(Debug, Clone, Default)]
pub struct SlotFinder {
    config: SlotFinderConfig,
}

impl SlotFinder {
    /// A step outside `1..=MAX_STEP_MINUTES` is replaced by the default.
    pub fn new(config: SlotFinderConfig) -> Self {
        let step_minutes = if (1..=MAX_STEP_MINUTES).contains(&config.step_minutes) {
            config.step_minutes
        } else {
            DEFAULT_STEP_MINUTES
        };
        Self { config: SlotFinderConfig { step_minutes, ..config } }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(SlotFinderConfig::from_app_config(config))
    }

    pub fn config(&self) -> SlotFinderConfig {
        self.config
    }

    /// Candidate slots of `session_duration_minutes` across `search_range`,
    /// chronological and free of duplicates.
    ///
    /// All input is validated before the scan starts. A day on which any
    /// resource has no matching window yields no slots; an empty result is
    /// not an error.
    pub fn find_available_slots(
        &self,
        patient: &ResourceAvailability,
        therapist: &ResourceAvailability,
        device: &ResourceAvailability,
        existing_bookings: &[Booking],
        session_duration_minutes: i64,
        search_range: &SearchRange,
    ) -> Result<Vec<CandidateSlot>, SchedulingError> {
        if session_duration_minutes <= 0 {
            return Err(SchedulingError::InvalidDuration(session_duration_minutes));
        }
        if search_range.start > search_range.end {
            return Err(SchedulingError::InvalidSearchRange {
                start: search_range.start,
                end: search_range.end,
            });
        }

        let resources = [
            parse_windows(patient)?,
            parse_windows(therapist)?,
            parse_windows(device)?,
        ];
        let busy = booked_intervals(existing_bookings)?;

        debug!(
            "Searching {}-minute slots from {} to {} ({:?})",
            session_duration_minutes, search_range.start, search_range.end, self.config.strategy
        );

        // no availability window spans more than a day
        let Some(duration) = Duration::try_minutes(session_duration_minutes)
            .filter(|duration| *duration <= Duration::days(1))
        else {
            debug!("No {}-minute session fits in a day", session_duration_minutes);
            return Ok(Vec::new());
        };
        let step = Duration::minutes(self.config.step_minutes);
        let last_minute = Duration::minutes(1);
        let mut slots = Vec::new();

        for date in search_range.days() {
            let day_intervals = [
                intervals_on(&resources[0], date),
                intervals_on(&resources[1], date),
                intervals_on(&resources[2], date),
            ];

            if day_intervals.iter().any(|intervals| intervals.is_empty()) {
                debug!("Skipping {}: a resource has no availability", date);
                continue;
            }

            let windows: Vec<Interval> = match self.config.strategy {
                IntersectionStrategy::Envelope => envelope(&day_intervals).into_iter().collect(),
                IntersectionStrategy::MergedSweep => merged_intersection(&day_intervals),
            };

            if windows.is_empty() {
                debug!("Skipping {}: availability windows do not overlap", date);
                continue;
            }

            for window in windows {
                let mut start = window.start;
                while start <= window.end {
                    let Some(end) = start.checked_add_signed(duration) else { break };
                    if end > window.end {
                        break;
                    }

                    let feasible = day_intervals.iter().all(|intervals| {
                        covered(intervals, start) && covered(intervals, end - last_minute)
                    });

                    if feasible && !conflicts_with_booking(start, end, &busy) {
                        slots.push(CandidateSlot {
                            date,
                            start_time: start.time(),
                            end_time: end.time(),
                        });
                    }

                    match start.checked_add_signed(step) {
                        Some(next) => start = next,
                        None => break,
                    }
                }
            }
        }

        let mut seen = HashSet::with_capacity(slots.len());
        slots.retain(|slot| seen.insert(slot.clone()));

        debug!("Found {} candidate slots", slots.len());
        Ok(slots)
    }
}

/// Slot search with the default 15-minute envelope scan.
pub fn find_available_slots(
    patient: &ResourceAvailability,
    therapist: &ResourceAvailability,
    device: &ResourceAvailability,
    existing_bookings: &[Booking],
    session_duration_minutes: i64,
    search_range: &SearchRange,
) -> Result<Vec<CandidateSlot>, SchedulingError> {
    SlotFinder::default().find_available_slots(
        patient,
        therapist,
        device,
        existing_bookings,
        session_duration_minutes,
        search_range,
    )
}

fn parse_windows(resource: &ResourceAvailability) -> Result<Vec<ParsedWindow>, SchedulingError> {
    resource.windows.iter()
        .map(|window| {
            let start = parse_clock_time(&window.start_time)?;
            let end = parse_clock_time(&window.end_time)?;

            if start >= end {
                return Err(SchedulingError::InvalidWindow {
                    kind: resource.kind,
                    resource_id: resource.resource_id.clone(),
                    start: window.start_time.clone(),
                    end: window.end_time.clone(),
                });
            }

            Ok(ParsedWindow { day: window.day, start, end })
        })
        .collect()
}

fn booked_intervals(bookings: &[Booking]) -> Result<Vec<Interval>, SchedulingError> {
    bookings.iter()
        .map(|booking| {
            if booking.duration_minutes <= 0 {
                return Err(SchedulingError::InvalidBooking {
                    id: booking.id,
                    reason: format!(
                        "duration must be positive, got {} minutes",
                        booking.duration_minutes
                    ),
                });
            }
            Ok(Interval { start: booking.start, end: booking.end()? })
        })
        .collect()
}

fn intervals_on(windows: &[ParsedWindow], date: NaiveDate) -> Vec<Interval> {
    let weekday = date.weekday();
    windows.iter()
        .filter(|window| window.day.matches(weekday))
        .map(|window| Interval {
            start: date.and_time(window.start),
            end: date.and_time(window.end),
        })
        .collect()
}

fn covered(intervals: &[Interval], instant: NaiveDateTime) -> bool {
    intervals.iter().any(|interval| interval.contains(instant))
}

/// A start that coincides with a booking's start is always a conflict.
fn conflicts_with_booking(start: NaiveDateTime, end: NaiveDateTime, busy: &[Interval]) -> bool {
    busy.iter().any(|booked| (start < booked.end && end > booked.start) || start == booked.start)
}

fn envelope(day_intervals: &[Vec<Interval>; 3]) -> Option<Interval> {
    let all = day_intervals.iter().flatten();
    let start = all.clone().map(|interval| interval.start).max()?;
    let end = all.map(|interval| interval.end).min()?;

    if end < start {
        return None;
    }
    Some(Interval { start, end })
}

fn merged_intersection(day_intervals: &[Vec<Interval>; 3]) -> Vec<Interval> {
    let patient = merge(day_intervals[0].clone());
    let therapist = merge(day_intervals[1].clone());
    let device = merge(day_intervals[2].clone());

    intersect(&intersect(&patient, &therapist), &device)
}

fn merge(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_by_key(|interval| interval.start);

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Two-pointer sweep over sorted, disjoint interval lists.
fn intersect(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut result = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        let start = a[i].start.max(b[j].start);
        let end = a[i].end.min(b[j].end);
        if start < end {
            result.push(Interval { start, end });
        }

        if a[i].end < b[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }

    result
}
