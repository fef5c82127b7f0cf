use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use doctor_cell::{AvailabilityService, DoctorAvailabilityResponse};

use crate::models::{AppointmentError, BookedSlotsResponse};
use crate::services::booking::{utc_day_range, BookingLedger};

/// Answers "what can I book" by combining the doctor's template with the ledger.
pub struct SlotQueryService {
    availability: Arc<AvailabilityService>,
    ledger: Arc<BookingLedger>,
}

impl SlotQueryService {
    pub fn new(availability: Arc<AvailabilityService>, ledger: Arc<BookingLedger>) -> Self {
        Self { availability, ledger }
    }

    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<DoctorAvailabilityResponse, AppointmentError> {
        // Wall-clock dates may sit up to 14h either side of the UTC day.
        let (from, to) = utc_day_range(date, 1, 2)?;
        let booked = self.ledger.booked_start_times_between(doctor_id, from, to).await?;

        let available_slots = self
            .availability
            .available_slots(doctor_id, date, &booked)
            .await
            .map_err(|e| AppointmentError::Storage(e.to_string()))?;

        Ok(DoctorAvailabilityResponse {
            doctor_id,
            date,
            available_slots,
        })
    }

    pub async fn booked_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<BookedSlotsResponse, AppointmentError> {
        Ok(BookedSlotsResponse {
            doctor_id,
            booked_start_times: self.ledger.booked_start_times(doctor_id, date).await?,
        })
    }
}
