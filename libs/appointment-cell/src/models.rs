// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::auth::{Actor, ActorRole};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub slot_start: DateTime<Utc>,
    pub slot_end: DateTime<Utc>,
    pub duration_minutes: i64,
    pub consultation_type: ConsultationType,
    pub status: AppointmentStatus,
    pub symptoms: String,
    pub consultation_fee: f64,
    pub platform_fee: f64,
    pub total_amount: f64,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub payment_order_id: Option<String>,
    pub payment_id: Option<String>,
    pub payment_signature: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub room_token: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<ActorRole>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// True when `actor` is this appointment's patient or doctor, in that role.
    pub fn is_party(&self, actor: &Actor) -> bool {
        match actor.role {
            ActorRole::Patient => self.patient_id == actor.id,
            ActorRole::Doctor => self.doctor_id == actor.id,
        }
    }

    /// Reserves the slot unless cancelled.
    pub fn holds_slot(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }

    pub fn apply_status_update(&mut self, update: &StatusUpdate) {
        self.status = update.status;
        if let Some(at) = update.started_at {
            self.started_at = Some(at);
        }
        if let Some(at) = update.completed_at {
            self.completed_at = Some(at);
        }
        if let Some(at) = update.cancelled_at {
            self.cancelled_at = Some(at);
        }
        if let Some(role) = update.cancelled_by {
            self.cancelled_by = Some(role);
        }
        if let Some(prescription) = &update.prescription {
            self.prescription = Some(prescription.clone());
        }
        if let Some(notes) = &update.notes {
            self.notes = Some(notes.clone());
        }
        self.updated_at = update.updated_at;
    }

    pub fn apply_payment_update(&mut self, update: &PaymentUpdate) {
        self.payment_status = update.payment_status;
        if let Some(order_id) = &update.payment_order_id {
            self.payment_order_id = Some(order_id.clone());
        }
        if let Some(payment_id) = &update.payment_id {
            self.payment_id = Some(payment_id.clone());
        }
        if let Some(signature) = &update.payment_signature {
            self.payment_signature = Some(signature.clone());
        }
        if let Some(at) = update.paid_at {
            self.paid_at = Some(at);
        }
        if let Some(method) = &update.payment_method {
            self.payment_method = Some(method.clone());
        }
        self.updated_at = update.updated_at;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationType {
    #[default]
    #[serde(alias = "Video Consultation", alias = "Video")]
    Video,

    #[serde(alias = "Voice Call", alias = "Voice")]
    Voice,
}

impl fmt::Display for ConsultationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsultationType::Video => write!(f, "video"),
            ConsultationType::Voice => write!(f, "voice"),
        }
    }
}

// ==============================================================================
// STORE UPDATE MODELS
// ==============================================================================

/// Lifecycle fields written by a status transition. `None` leaves a field unchanged.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<ActorRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StatusUpdate {
    pub fn to(status: AppointmentStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            cancelled_by: None,
            prescription: None,
            notes: None,
            updated_at: now,
        }
    }
}

/// Payment bookkeeping. Never touches status or the slot.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentUpdate {
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub slot_start: DateTime<Utc>,
    pub slot_end: DateTime<Utc>,
    #[serde(default)]
    pub consultation_type: ConsultationType,
    pub symptoms: String,
    pub consultation_fee: Option<f64>,
    pub platform_fee: Option<f64>,
    pub total_amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteConsultationRequest {
    pub prescription: String,
    pub notes: Option<String>,
}

/// `?status=scheduled,in_progress` narrows a listing; absent or empty lists everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    #[serde(default, deserialize_with = "status_list")]
    pub status: Vec<AppointmentStatus>,
}

fn status_list<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Vec<AppointmentStatus>, D::Error> {
    use serde::de::IntoDeserializer;

    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| AppointmentStatus::deserialize(part.into_deserializer()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: Uuid,
    pub name: String,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
}

/// An appointment with display summaries of both participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetails {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor: Option<DoctorSummary>,
    pub patient: Option<PatientSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinTicket {
    pub room_token: String,
    pub appointment: Appointment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinEligibility {
    pub appointment_id: Uuid,
    pub can_join: bool,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedSlotsResponse {
    pub doctor_id: Uuid,
    pub booked_start_times: Vec<DateTime<Utc>>,
}

// ==============================================================================
// PAYMENT MODELS
// ==============================================================================

/// Proof returned by the gateway checkout, submitted by the patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentProof {
    #[serde(alias = "razorpay_order_id")]
    pub order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub order_id: String,
    pub amount: f64,
    pub currency: String,
    pub key_id: String,
}

// ==============================================================================
// RULES AND ERRORS
// ==============================================================================

/// Tunables of the booking ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingRules {
    pub min_symptoms_length: usize,
    pub join_window_before_minutes: i64,
    pub join_window_after_minutes: i64,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            min_symptoms_length: 10,
            join_window_before_minutes: 15,
            join_window_after_minutes: 120,
        }
    }
}

impl From<&shared_config::AppConfig> for BookingRules {
    fn from(config: &shared_config::AppConfig) -> Self {
        Self {
            min_symptoms_length: config.min_symptoms_length,
            join_window_before_minutes: config.join_window_before_minutes,
            join_window_after_minutes: config.join_window_after_minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppointmentError {
    #[error("Invalid booking request: {0}")]
    Validation(String),

    #[error("Appointment slot not available")]
    SlotUnavailable,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidTransition(AppointmentStatus),

    #[error("Not allowed to act on this appointment")]
    Forbidden,

    #[error("Payment verification failed")]
    VerificationFailed,

    #[error("Appointment is already paid")]
    AlreadyPaid,

    #[error("Appointment not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),
}
