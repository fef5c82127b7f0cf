// libs/doctor-cell/src/services/availability.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::auth::Actor;

use crate::models::{AvailabilityTemplate, Slot, UpsertAvailabilityRequest, ValidationError};
use crate::services::template_store::{TemplateStore, TemplateStoreError};

/// Offsets beyond ±14h do not exist on any civil clock.
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Checks a template before it is stored. Pure.
pub fn validate(template: &AvailabilityTemplate) -> Result<(), ValidationError> {
    if template.valid_from > template.valid_until {
        return Err(ValidationError::InvalidDateRange {
            from: template.valid_from,
            until: template.valid_until,
        });
    }

    if let Some(day) = template.excluded_weekdays.iter().find(|day| **day > 6) {
        return Err(ValidationError::InvalidWeekday(*day));
    }

    if template.daily_windows.is_empty() {
        return Err(ValidationError::NoWindows);
    }

    if let Some(index) = template
        .daily_windows
        .iter()
        .position(|window| window.start >= window.end)
    {
        return Err(ValidationError::EmptyWindow { index });
    }

    // Compare neighbours in chronological order, but report the caller's indices.
    let mut order: Vec<usize> = (0..template.daily_windows.len()).collect();
    order.sort_by_key(|&i| template.daily_windows[i].start);
    for pair in order.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if template.daily_windows[a].overlaps(&template.daily_windows[b]) {
            return Err(ValidationError::OverlappingWindows {
                first: a.min(b),
                second: a.max(b),
            });
        }
    }

    let duration = template.slot_duration_minutes;
    if duration <= 0 {
        return Err(ValidationError::NonPositiveSlotDuration(duration));
    }
    if template
        .daily_windows
        .iter()
        .all(|window| window.span_minutes() < i64::from(duration))
    {
        return Err(ValidationError::SlotDurationExceedsWindows(duration));
    }

    if template.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
        return Err(ValidationError::InvalidUtcOffset(template.utc_offset_minutes));
    }

    Ok(())
}

/// `None` when the shifted instant falls off the end of the calendar.
fn wall_clock_to_utc(local: NaiveDateTime, utc_offset_minutes: i32) -> Option<DateTime<Utc>> {
    local
        .checked_sub_signed(Duration::minutes(i64::from(utc_offset_minutes)))
        .map(|utc| Utc.from_utc_datetime(&utc))
}

/// Bookable slots of `template` on `target_date`.
///
/// Windows are walked in their stored order and each is cut into
/// `slot_duration_minutes` pieces; a trailing remainder shorter than one slot is
/// dropped. Slots whose start instant equals one of `booked_start_times` are
/// removed (exact match, not interval overlap). Deterministic and free of I/O.
pub fn derive_slots(
    template: &AvailabilityTemplate,
    target_date: NaiveDate,
    booked_start_times: &[DateTime<Utc>],
) -> Vec<Slot> {
    if !template.covers(target_date) {
        return Vec::new();
    }
    if template.excluded_weekdays.contains(&weekday_index(target_date)) {
        return Vec::new();
    }
    if template.slot_duration_minutes <= 0 {
        return Vec::new();
    }

    let step = Duration::minutes(i64::from(template.slot_duration_minutes));
    let booked: HashSet<&DateTime<Utc>> = booked_start_times.iter().collect();
    let mut slots = Vec::new();

    for window in &template.daily_windows {
        let window_end = target_date.and_time(window.end);
        let mut cursor = target_date.and_time(window.start);

        while let Some(next) = cursor.checked_add_signed(step).filter(|next| *next <= window_end) {
            let slot = wall_clock_to_utc(cursor, template.utc_offset_minutes)
                .and_then(|start_time| Some((start_time, start_time.checked_add_signed(step)?)));
            if let Some((start_time, end_time)) = slot {
                if !booked.contains(&start_time) {
                    slots.push(Slot { start_time, end_time });
                }
            }
            cursor = next;
        }
    }

    slots
}

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Only the doctor may edit their availability")]
    Forbidden,

    #[error("No availability template for doctor {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] TemplateStoreError),
}

/// Owns the doctor side of scheduling: storing templates and answering slot queries.
pub struct AvailabilityService {
    store: Arc<dyn TemplateStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }

    /// Replaces the doctor's template. Existing appointments are untouched.
    pub async fn set_template(
        &self,
        actor: &Actor,
        request: UpsertAvailabilityRequest,
    ) -> Result<AvailabilityTemplate, AvailabilityError> {
        if !actor.is_doctor() {
            warn!("Actor {} with role {} tried to edit availability", actor.id, actor.role);
            return Err(AvailabilityError::Forbidden);
        }

        let template = AvailabilityTemplate::from_request(actor.id, request);
        validate(&template)?;

        let stored = self.store.put(template.with_sorted_windows()).await?;
        info!(
            "Availability template updated for doctor {} ({} windows, {} min slots)",
            stored.doctor_id,
            stored.daily_windows.len(),
            stored.slot_duration_minutes
        );
        Ok(stored)
    }

    pub async fn get_template(&self, doctor_id: Uuid) -> Result<AvailabilityTemplate, AvailabilityError> {
        self.store
            .get(doctor_id)
            .await?
            .ok_or(AvailabilityError::NotFound(doctor_id))
    }

    /// Slots for `date`, minus the supplied booked start times.
    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        booked_start_times: &[DateTime<Utc>],
    ) -> Result<Vec<Slot>, AvailabilityError> {
        let template = match self.store.get(doctor_id).await? {
            Some(template) => template,
            None => {
                debug!("Doctor {} has no template, no slots on {}", doctor_id, date);
                return Ok(Vec::new());
            }
        };

        let slots = derive_slots(&template, date, booked_start_times);
        debug!("Derived {} slots for doctor {} on {}", slots.len(), doctor_id, date);
        Ok(slots)
    }
}
