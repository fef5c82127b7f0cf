use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::extractor::CurrentActor;

use crate::models::{AvailabilityTemplate, UpsertAvailabilityRequest};
use crate::services::availability::{AvailabilityError, AvailabilityService};

/// Shared handles for the doctor routes.
pub struct DoctorState {
    pub config: Arc<AppConfig>,
    pub availability: Arc<AvailabilityService>,
}

impl From<AvailabilityError> for AppError {
    fn from(e: AvailabilityError) -> Self {
        match e {
            AvailabilityError::Validation(err) => AppError::ValidationError(err.to_string()),
            AvailabilityError::Forbidden => AppError::Forbidden(e.to_string()),
            AvailabilityError::NotFound(_) => AppError::NotFound(e.to_string()),
            AvailabilityError::Store(err) => AppError::Database(err.to_string()),
        }
    }
}

#[axum::debug_handler]
pub async fn set_my_availability(
    State(state): State<Arc<DoctorState>>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<UpsertAvailabilityRequest>,
) -> Result<Json<AvailabilityTemplate>, AppError> {
    debug!("Doctor {} replacing availability template", actor.id);

    let template = state.availability.set_template(&actor, request).await?;
    Ok(Json(template))
}

#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(state): State<Arc<DoctorState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<AvailabilityTemplate>, AppError> {
    let template = state.availability.get_template(doctor_id).await?;
    Ok(Json(template))
}
