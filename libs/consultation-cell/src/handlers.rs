// libs/consultation-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use appointment_cell::models::{Appointment, CompleteConsultationRequest};
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::extractor::CurrentActor;

use crate::models::{LeaveReport, SessionView};
use crate::services::ConsultationSessionService;

pub struct ConsultationState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<ConsultationSessionService>,
}

#[axum::debug_handler]
pub async fn join_consultation(
    State(state): State<Arc<ConsultationState>>,
    CurrentActor(actor): CurrentActor,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let view = state.sessions.on_room_joined(appointment_id, &actor).await?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn leave_consultation(
    State(state): State<Arc<ConsultationState>>,
    CurrentActor(actor): CurrentActor,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<LeaveReport>, AppError> {
    let report = state.sessions.on_room_left(appointment_id, &actor).await?;
    Ok(Json(report))
}

#[axum::debug_handler]
pub async fn complete_consultation(
    State(state): State<Arc<ConsultationState>>,
    CurrentActor(actor): CurrentActor,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CompleteConsultationRequest>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state.sessions.complete(appointment_id, &actor, request).await?;
    Ok(Json(appointment))
}
