// libs/appointment-cell/src/services/store.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::DatabaseError;

use crate::models::{Appointment, AppointmentStatus, PaymentStatus, PaymentUpdate, StatusUpdate};
use crate::services::conflict::intervals_overlap;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The slot is already held by another non-cancelled appointment.
    #[error("Slot already taken: {0}")]
    Conflict(String),

    /// The doctor or patient the row points at does not exist.
    #[error("Unknown reference: {0}")]
    UnknownReference(String),

    #[error("Appointment storage failed: {0}")]
    Backend(String),

    #[error("Stored appointment could not be decoded: {0}")]
    Corrupt(String),
}

impl From<DatabaseError> for StoreError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::ConstraintViolation { code, message } => {
                StoreError::Conflict(format!("{}: {}", code, message))
            }
            DatabaseError::ForeignKeyViolation(message) => StoreError::UnknownReference(message),
            DatabaseError::Decode(inner) => StoreError::Corrupt(inner.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Persistence for appointments.
///
/// `insert` is the double-booking guard: it must refuse an appointment whose
/// interval overlaps, or whose `(doctor_id, slot_start)` equals, a non-cancelled
/// appointment of the same doctor, atomically with respect to other inserts.
/// Updates are compare-and-set and return `None` when the guard no longer holds.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Non-cancelled appointments of `doctor_id` overlapping `[start, end)`.
    async fn find_overlapping(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Non-cancelled appointments of `doctor_id` starting in `[from, to)`.
    async fn find_starting_between(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// An empty `statuses` slice matches every status.
    async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn list_for_patient(
        &self,
        patient_id: Uuid,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        update: StatusUpdate,
    ) -> Result<Option<Appointment>, StoreError>;

    async fn update_payment(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        update: PaymentUpdate,
    ) -> Result<Option<Appointment>, StoreError>;
}

fn status_matches(statuses: &[AppointmentStatus], status: AppointmentStatus) -> bool {
    statuses.is_empty() || statuses.contains(&status)
}

fn sorted_by_slot(mut appointments: Vec<Appointment>) -> Vec<Appointment> {
    appointments.sort_by_key(|a| (a.slot_start, a.id));
    appointments
}

/// Process-local store; check-and-insert happen under one write lock.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        let mut appointments = self.appointments.write().await;

        let clash = appointments.values().find(|existing| {
            existing.doctor_id == appointment.doctor_id
                && existing.holds_slot()
                && (existing.slot_start == appointment.slot_start
                    || intervals_overlap(
                        existing.slot_start,
                        existing.slot_end,
                        appointment.slot_start,
                        appointment.slot_end,
                    ))
        });
        if let Some(existing) = clash {
            return Err(StoreError::Conflict(format!(
                "doctor {} already booked from {} (appointment {})",
                existing.doctor_id, existing.slot_start, existing.id
            )));
        }

        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn find_overlapping(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self.appointments.read().await;
        Ok(sorted_by_slot(
            appointments
                .values()
                .filter(|a| {
                    a.doctor_id == doctor_id
                        && a.holds_slot()
                        && intervals_overlap(a.slot_start, a.slot_end, start, end)
                })
                .cloned()
                .collect(),
        ))
    }

    async fn find_starting_between(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self.appointments.read().await;
        Ok(sorted_by_slot(
            appointments
                .values()
                .filter(|a| {
                    a.doctor_id == doctor_id && a.holds_slot() && from <= a.slot_start && a.slot_start < to
                })
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self.appointments.read().await;
        Ok(sorted_by_slot(
            appointments
                .values()
                .filter(|a| a.doctor_id == doctor_id && status_matches(statuses, a.status))
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_patient(
        &self,
        patient_id: Uuid,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self.appointments.read().await;
        Ok(sorted_by_slot(
            appointments
                .values()
                .filter(|a| a.patient_id == patient_id && status_matches(statuses, a.status))
                .cloned()
                .collect(),
        ))
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        update: StatusUpdate,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut appointments = self.appointments.write().await;
        match appointments.get_mut(&id) {
            Some(appointment) if appointment.status == expected => {
                appointment.apply_status_update(&update);
                Ok(Some(appointment.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn update_payment(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        update: PaymentUpdate,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut appointments = self.appointments.write().await;
        match appointments.get_mut(&id) {
            Some(appointment) if appointment.payment_status == expected => {
                appointment.apply_payment_update(&update);
                Ok(Some(appointment.clone()))
            }
            _ => Ok(None),
        }
    }
}
