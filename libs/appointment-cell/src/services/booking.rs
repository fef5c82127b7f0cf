// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_models::auth::Actor;
use shared_utils::clock::Clock;

use crate::models::{
    Appointment, AppointmentDetails, AppointmentError, AppointmentStatus, BookAppointmentRequest,
    BookingRules, JoinEligibility, JoinTicket, PaymentStatus, StatusUpdate,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::directory::ProfileDirectory;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::store::{AppointmentStore, StoreError};

pub(crate) fn storage_error(e: StoreError) -> AppointmentError {
    match e {
        StoreError::Conflict(_) => AppointmentError::SlotUnavailable,
        StoreError::UnknownReference(_) => {
            AppointmentError::Validation("doctor or patient does not exist".to_string())
        }
        other => AppointmentError::Storage(other.to_string()),
    }
}

/// `[midnight(date) - before days, midnight(date) + after days)` in UTC.
/// Dates at the edge of the calendar have no such range and are rejected.
pub(crate) fn utc_day_range(
    date: NaiveDate,
    days_before: i64,
    days_after: i64,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AppointmentError> {
    let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    let from = midnight.checked_sub_signed(Duration::days(days_before));
    let to = midnight.checked_add_signed(Duration::days(days_after));
    match (from, to) {
        (Some(from), Some(to)) => Ok((from, to)),
        _ => Err(AppointmentError::Validation(format!("date {} is out of range", date))),
    }
}

fn required_amount(field: &str, value: Option<f64>) -> Result<f64, AppointmentError> {
    match value {
        Some(amount) if amount.is_finite() && amount >= 0.0 => Ok(amount),
        Some(amount) => Err(AppointmentError::Validation(format!(
            "{} must be a non-negative amount, got {}",
            field, amount
        ))),
        None => Err(AppointmentError::Validation(format!("{} is required", field))),
    }
}

/// The appointment aggregate. Every status mutation goes through here.
pub struct BookingLedger {
    store: Arc<dyn AppointmentStore>,
    directory: Arc<dyn ProfileDirectory>,
    clock: Arc<dyn Clock>,
    conflicts: ConflictDetectionService,
    lifecycle: AppointmentLifecycleService,
    rules: BookingRules,
}

impl BookingLedger {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        directory: Arc<dyn ProfileDirectory>,
        clock: Arc<dyn Clock>,
        rules: BookingRules,
    ) -> Self {
        Self {
            conflicts: ConflictDetectionService::new(store.clone()),
            lifecycle: AppointmentLifecycleService::new(rules),
            store,
            directory,
            clock,
            rules,
        }
    }

    fn validate_booking_request(&self, request: &BookAppointmentRequest) -> Result<(f64, f64, f64), AppointmentError> {
        let symptoms = request.symptoms.trim();
        if symptoms.is_empty() {
            return Err(AppointmentError::Validation("symptoms are required".to_string()));
        }
        if symptoms.chars().count() < self.rules.min_symptoms_length {
            return Err(AppointmentError::Validation(format!(
                "symptoms must be at least {} characters",
                self.rules.min_symptoms_length
            )));
        }

        if request.slot_end <= request.slot_start {
            return Err(AppointmentError::Validation(
                "slot_end must be after slot_start".to_string(),
            ));
        }

        Ok((
            required_amount("consultation_fee", request.consultation_fee)?,
            required_amount("platform_fee", request.platform_fee)?,
            required_amount("total_amount", request.total_amount)?,
        ))
    }

    /// Reserves a slot for the calling patient.
    #[instrument(skip(self, request), fields(doctor_id = %request.doctor_id, slot_start = %request.slot_start))]
    pub async fn book(
        &self,
        actor: &Actor,
        request: BookAppointmentRequest,
    ) -> Result<AppointmentDetails, AppointmentError> {
        if !actor.is_patient() {
            warn!("Non-patient {} attempted to book", actor.id);
            return Err(AppointmentError::Forbidden);
        }

        let (consultation_fee, platform_fee, total_amount) = self.validate_booking_request(&request)?;

        let conflicting = self
            .conflicts
            .check_conflicts(request.doctor_id, request.slot_start, request.slot_end)
            .await?;
        if !conflicting.is_empty() {
            return Err(AppointmentError::SlotUnavailable);
        }

        let now = self.clock.now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_id: request.doctor_id,
            patient_id: actor.id,
            slot_start: request.slot_start,
            slot_end: request.slot_end,
            duration_minutes: (request.slot_end - request.slot_start).num_minutes(),
            consultation_type: request.consultation_type,
            status: AppointmentStatus::Scheduled,
            symptoms: request.symptoms.trim().to_string(),
            consultation_fee,
            platform_fee,
            total_amount,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            payment_order_id: None,
            payment_id: None,
            payment_signature: None,
            paid_at: None,
            prescription: None,
            notes: None,
            room_token: format!("room_{}", Uuid::new_v4().simple()),
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
        };

        // A racing booking that slipped past the pre-check is refused here.
        let stored = self.store.insert(appointment).await.map_err(storage_error)?;
        info!("Appointment {} booked by patient {}", stored.id, stored.patient_id);

        Ok(self.with_summaries(stored).await)
    }

    pub async fn cancel(&self, appointment_id: Uuid, actor: &Actor) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(appointment_id).await?;
        if !appointment.is_party(actor) {
            return Err(AppointmentError::Forbidden);
        }

        let now = self.clock.now();
        self.lifecycle.validate_cancellation(&appointment, now)?;

        let mut update = StatusUpdate::to(AppointmentStatus::Cancelled, now);
        update.cancelled_at = Some(now);
        update.cancelled_by = Some(actor.role);

        let cancelled = self.transition(&appointment, update).await?;
        info!("Appointment {} cancelled by {} {}", cancelled.id, actor.role, actor.id);
        Ok(cancelled)
    }

    /// Enters the session. Re-joining returns the same room token.
    pub async fn join(&self, appointment_id: Uuid, actor: &Actor) -> Result<JoinTicket, AppointmentError> {
        let appointment = self.load(appointment_id).await?;
        if !appointment.is_party(actor) {
            return Err(AppointmentError::Forbidden);
        }

        let status = appointment.status;
        let joined = match status {
            AppointmentStatus::InProgress => appointment,
            AppointmentStatus::Scheduled => {
                let now = self.clock.now();
                let mut update = StatusUpdate::to(AppointmentStatus::InProgress, now);
                update.started_at = Some(now);

                match self.transition(&appointment, update).await {
                    Ok(updated) => updated,
                    // The other participant joined first.
                    Err(AppointmentError::InvalidTransition(AppointmentStatus::InProgress)) => {
                        self.load(appointment_id).await?
                    }
                    Err(e) => return Err(e),
                }
            }
            status => return Err(AppointmentError::InvalidTransition(status)),
        };

        debug!("{} {} joined appointment {}", actor.role, actor.id, joined.id);
        Ok(JoinTicket {
            room_token: joined.room_token.clone(),
            appointment: joined,
        })
    }

    pub async fn complete_with_prescription(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
        prescription: &str,
        notes: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(appointment_id).await?;
        if !(actor.is_doctor() && appointment.is_party(actor)) {
            return Err(AppointmentError::Forbidden);
        }

        let prescription = prescription.trim();
        if prescription.is_empty() {
            return Err(AppointmentError::Validation("prescription is required".to_string()));
        }

        let now = self.clock.now();
        let mut update = StatusUpdate::to(AppointmentStatus::Completed, now);
        update.completed_at = Some(now);
        update.prescription = Some(prescription.to_string());
        update.notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

        let completed = self.transition(&appointment, update).await?;
        info!("Appointment {} completed by doctor {}", completed.id, actor.id);
        Ok(completed)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
    ) -> Result<AppointmentDetails, AppointmentError> {
        let appointment = self.load(appointment_id).await?;
        if !appointment.is_party(actor) {
            return Err(AppointmentError::Forbidden);
        }
        Ok(self.with_summaries(appointment).await)
    }

    pub async fn join_eligibility(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
    ) -> Result<JoinEligibility, AppointmentError> {
        let appointment = self.load(appointment_id).await?;
        if !appointment.is_party(actor) {
            return Err(AppointmentError::Forbidden);
        }

        let (opens_at, closes_at) = self.lifecycle.join_window(appointment.slot_start);
        Ok(JoinEligibility {
            appointment_id,
            can_join: self.lifecycle.can_join_now(&appointment, self.clock.now()),
            opens_at,
            closes_at,
        })
    }

    pub async fn list_for_doctor(
        &self,
        actor: &Actor,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if !actor.is_doctor() {
            return Err(AppointmentError::Forbidden);
        }
        self.store
            .list_for_doctor(actor.id, statuses)
            .await
            .map_err(storage_error)
    }

    pub async fn list_for_patient(
        &self,
        actor: &Actor,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if !actor.is_patient() {
            return Err(AppointmentError::Forbidden);
        }
        self.store
            .list_for_patient(actor.id, statuses)
            .await
            .map_err(storage_error)
    }

    /// Start instants of the doctor's non-cancelled appointments on `date` (UTC).
    pub async fn booked_start_times(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<DateTime<Utc>>, AppointmentError> {
        let (from, to) = utc_day_range(date, 0, 1)?;
        self.booked_start_times_between(doctor_id, from, to).await
    }

    pub async fn booked_start_times_between(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, AppointmentError> {
        let appointments = self
            .store
            .find_starting_between(doctor_id, from, to)
            .await
            .map_err(storage_error)?;
        Ok(appointments.into_iter().map(|a| a.slot_start).collect())
    }

    pub(crate) async fn load(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .get(appointment_id)
            .await
            .map_err(storage_error)?
            .ok_or(AppointmentError::NotFound)
    }

    async fn transition(
        &self,
        current: &Appointment,
        update: StatusUpdate,
    ) -> Result<Appointment, AppointmentError> {
        self.lifecycle
            .validate_status_transition(current.status, update.status)?;

        match self
            .store
            .update_status(current.id, current.status, update)
            .await
            .map_err(storage_error)?
        {
            Some(updated) => Ok(updated),
            None => {
                let latest = self.load(current.id).await?;
                warn!(
                    "Appointment {} changed concurrently: expected {}, found {}",
                    current.id, current.status, latest.status
                );
                Err(AppointmentError::InvalidTransition(latest.status))
            }
        }
    }

    /// Summaries are display sugar; a lookup failure never fails the operation.
    async fn with_summaries(&self, appointment: Appointment) -> AppointmentDetails {
        let doctor = match self.directory.doctor_summary(appointment.doctor_id).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Doctor summary lookup failed for {}: {}", appointment.doctor_id, e);
                None
            }
        };
        let patient = match self.directory.patient_summary(appointment.patient_id).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Patient summary lookup failed for {}: {}", appointment.patient_id, e);
                None
            }
        };

        AppointmentDetails {
            appointment,
            doctor,
            patient,
        }
    }
}
