// libs/consultation-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentStatus, JoinTicket};

/// What a participant gets back on entering the room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub appointment_id: Uuid,
    pub room_token: String,
    pub status: AppointmentStatus,
    pub started_at: Option<DateTime<Utc>>,
}

impl From<JoinTicket> for SessionView {
    fn from(ticket: JoinTicket) -> Self {
        Self {
            appointment_id: ticket.appointment.id,
            room_token: ticket.room_token,
            status: ticket.appointment.status,
            started_at: ticket.appointment.started_at,
        }
    }
}

/// Reported when a participant leaves. Leaving never changes the appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveReport {
    pub appointment_id: Uuid,
    pub status: AppointmentStatus,
    /// The consultation ran but the doctor has not closed it yet.
    pub awaiting_prescription: bool,
}

impl LeaveReport {
    pub fn for_appointment(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.id,
            status: appointment.status,
            awaiting_prescription: appointment.status == AppointmentStatus::InProgress,
        }
    }
}
