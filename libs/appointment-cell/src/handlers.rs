// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use doctor_cell::DoctorAvailabilityResponse;
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::extractor::CurrentActor;

use crate::models::{
    Appointment, AppointmentDetails, AppointmentError, AppointmentListQuery, BookAppointmentRequest,
    BookedSlotsResponse, JoinEligibility, PaymentOrder, PaymentProof,
};
use crate::services::{BookingLedger, PaymentService, SlotQueryService};

/// Shared handles for the appointment routes.
pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub ledger: Arc<BookingLedger>,
    pub slots: Arc<SlotQueryService>,
    pub payments: Arc<PaymentService>,
}

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::SlotUnavailable => {
                AppError::Conflict("This time slot is already booked".to_string())
            }
            AppointmentError::InvalidTransition(_) => {
                AppError::Conflict("Appointment cannot be modified in its current status".to_string())
            }
            AppointmentError::Forbidden => AppError::Forbidden(e.to_string()),
            AppointmentError::VerificationFailed | AppointmentError::AlreadyPaid => {
                AppError::BadRequest(e.to_string())
            }
            AppointmentError::NotFound => AppError::NotFound(e.to_string()),
            AppointmentError::Storage(msg) => AppError::Database(msg),
            AppointmentError::Gateway(msg) => AppError::ExternalService(msg),
        }
    }
}

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppointmentState>>,
    Path((doctor_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<DoctorAvailabilityResponse>, AppError> {
    let response = state.slots.available_slots(doctor_id, date).await?;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn get_booked_slots(
    State(state): State<Arc<AppointmentState>>,
    Path((doctor_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<BookedSlotsResponse>, AppError> {
    let response = state.slots.booked_slots(doctor_id, date).await?;
    Ok(Json(response))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppointmentState>>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentDetails>), AppError> {
    debug!("Booking request from {} for doctor {}", actor.id, request.doctor_id);

    let details = state.ledger.book(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    CurrentActor(actor): CurrentActor,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<AppointmentDetails>, AppError> {
    let details = state.ledger.get_appointment(appointment_id, &actor).await?;
    Ok(Json(details))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    CurrentActor(actor): CurrentActor,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state.ledger.cancel(appointment_id, &actor).await?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn get_join_eligibility(
    State(state): State<Arc<AppointmentState>>,
    CurrentActor(actor): CurrentActor,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<JoinEligibility>, AppError> {
    let eligibility = state.ledger.join_eligibility(appointment_id, &actor).await?;
    Ok(Json(eligibility))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppointmentState>>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.ledger.list_for_doctor(&actor, &query.status).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppointmentState>>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.ledger.list_for_patient(&actor, &query.status).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn create_payment_order(
    State(state): State<Arc<AppointmentState>>,
    CurrentActor(actor): CurrentActor,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<PaymentOrder>, AppError> {
    let order = state.payments.create_payment_order(appointment_id, &actor).await?;
    Ok(Json(order))
}

#[axum::debug_handler]
pub async fn verify_payment(
    State(state): State<Arc<AppointmentState>>,
    CurrentActor(actor): CurrentActor,
    Path(appointment_id): Path<Uuid>,
    Json(proof): Json<PaymentProof>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state.payments.mark_paid(appointment_id, &actor, proof).await?;
    Ok(Json(appointment))
}
