// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentError, AppointmentStatus, BookingRules};

/// Status rules of the booking ledger.
///
/// ```text
/// Scheduled  --join-->      InProgress
/// Scheduled  --complete-->  Completed
/// Scheduled  --cancel-->    Cancelled
/// InProgress --complete-->  Completed
/// InProgress --cancel-->    Cancelled
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AppointmentLifecycleService {
    rules: BookingRules,
}

impl AppointmentLifecycleService {
    pub fn new(rules: BookingRules) -> Self {
        Self { rules }
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current_status {
            AppointmentStatus::Scheduled => &[
                AppointmentStatus::InProgress,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::InProgress => &[AppointmentStatus::Completed, AppointmentStatus::Cancelled],
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
        }
    }

    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidTransition(current_status));
        }

        debug!("Status transition validated: {} -> {}", current_status, new_status);
        Ok(())
    }

    /// Patients and doctors may only call off a consultation that has not begun.
    pub fn validate_cancellation(
        &self,
        appointment: &Appointment,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        if appointment.status != AppointmentStatus::Scheduled || appointment.slot_start <= now {
            warn!(
                "Refusing to cancel appointment {} in status {} starting {}",
                appointment.id, appointment.status, appointment.slot_start
            );
            return Err(AppointmentError::InvalidTransition(appointment.status));
        }
        Ok(())
    }

    /// Inclusive bounds of the period in which the session room may be entered.
    pub fn join_window(&self, slot_start: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            slot_start - Duration::minutes(self.rules.join_window_before_minutes),
            slot_start + Duration::minutes(self.rules.join_window_after_minutes),
        )
    }

    pub fn can_join_now(&self, appointment: &Appointment, now: DateTime<Utc>) -> bool {
        if !matches!(
            appointment.status,
            AppointmentStatus::Scheduled | AppointmentStatus::InProgress
        ) {
            return false;
        }

        let (opens_at, closes_at) = self.join_window(appointment.slot_start);
        opens_at <= now && now <= closes_at
    }
}
