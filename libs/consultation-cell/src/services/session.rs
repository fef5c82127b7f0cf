// libs/consultation-cell/src/services/session.rs
use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentError, CompleteConsultationRequest};
use appointment_cell::services::BookingLedger;
use shared_models::auth::Actor;

use crate::models::{LeaveReport, SessionView};

/// Turns consultation room events into ledger operations.
/// Holds no state of its own; every decision is made by the ledger.
pub struct ConsultationSessionService {
    ledger: Arc<BookingLedger>,
}

impl ConsultationSessionService {
    pub fn new(ledger: Arc<BookingLedger>) -> Self {
        Self { ledger }
    }

    /// A participant entered the room. The first join starts the consultation.
    #[instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn on_room_joined(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
    ) -> Result<SessionView, AppointmentError> {
        let ticket = self.ledger.join(appointment_id, actor).await?;
        Ok(SessionView::from(ticket))
    }

    /// A participant left the room.
    pub async fn on_room_left(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
    ) -> Result<LeaveReport, AppointmentError> {
        let details = self.ledger.get_appointment(appointment_id, actor).await?;
        let report = LeaveReport::for_appointment(&details.appointment);

        if report.awaiting_prescription && actor.is_doctor() {
            info!("Doctor {} left appointment {} without completing it", actor.id, appointment_id);
        }
        Ok(report)
    }

    #[instrument(skip(self, actor, request), fields(actor_id = %actor.id))]
    pub async fn complete(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
        request: CompleteConsultationRequest,
    ) -> Result<Appointment, AppointmentError> {
        self.ledger
            .complete_with_prescription(appointment_id, actor, &request.prescription, request.notes)
            .await
    }
}
