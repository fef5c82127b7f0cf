use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Wall-clock times travel as "HH:MM" (seconds are accepted on input).
mod wall_clock {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|_| de::Error::custom(format!("invalid wall-clock time '{}', expected HH:MM", raw)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyWindow {
    #[serde(with = "wall_clock")]
    pub start: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end: NaiveTime,
}

impl DailyWindow {
    /// Convenience for "09:00"-style literals; `None` on a malformed time.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        let start = NaiveTime::parse_from_str(start, "%H:%M").ok()?;
        let end = NaiveTime::parse_from_str(end, "%H:%M").ok()?;
        Some(Self { start, end })
    }

    pub fn span_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn overlaps(&self, other: &DailyWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A doctor's recurring weekly schedule. Weekday indices run 0 (Sunday) to 6 (Saturday).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityTemplate {
    pub doctor_id: Uuid,
    pub valid_from: NaiveDate,
    pub valid_until: NaiveDate,
    #[serde(default)]
    pub excluded_weekdays: BTreeSet<u8>,
    pub daily_windows: Vec<DailyWindow>,
    pub slot_duration_minutes: i32,
    #[serde(default)]
    pub utc_offset_minutes: i32,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityTemplate {
    pub fn from_request(doctor_id: Uuid, request: UpsertAvailabilityRequest) -> Self {
        Self {
            doctor_id,
            valid_from: request.valid_from,
            valid_until: request.valid_until,
            excluded_weekdays: request.excluded_weekdays,
            daily_windows: request.daily_windows,
            slot_duration_minutes: request.slot_duration_minutes,
            utc_offset_minutes: request.utc_offset_minutes.unwrap_or(0),
            updated_at: Utc::now(),
        }
    }

    /// Stored templates keep their windows in chronological order.
    pub fn with_sorted_windows(mut self) -> Self {
        self.daily_windows.sort_by_key(|window| window.start);
        self
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.valid_from <= date && date <= self.valid_until
    }
}

/// A candidate bookable interval. Derived per query, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertAvailabilityRequest {
    pub valid_from: NaiveDate,
    pub valid_until: NaiveDate,
    #[serde(default)]
    pub excluded_weekdays: BTreeSet<u8>,
    pub daily_windows: Vec<DailyWindow>,
    pub slot_duration_minutes: i32,
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("valid_from {from} is after valid_until {until}")]
    InvalidDateRange { from: NaiveDate, until: NaiveDate },

    #[error("excluded weekday {0} is outside 0-6")]
    InvalidWeekday(u8),

    #[error("at least one daily window is required")]
    NoWindows,

    #[error("window {index} must start before it ends")]
    EmptyWindow { index: usize },

    #[error("windows {first} and {second} overlap")]
    OverlappingWindows { first: usize, second: usize },

    #[error("slot duration must be positive, got {0}")]
    NonPositiveSlotDuration(i32),

    #[error("slot duration of {0} minutes does not fit in any window")]
    SlotDurationExceedsWindows(i32),

    #[error("UTC offset of {0} minutes is out of range")]
    InvalidUtcOffset(i32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorAvailabilityResponse {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub available_slots: Vec<Slot>,
}
