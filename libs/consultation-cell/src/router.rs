// libs/consultation-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{post, put},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, ConsultationState};

pub fn consultation_routes(state: Arc<ConsultationState>) -> Router {
    Router::new()
        .route("/{appointment_id}/join", post(handlers::join_consultation))
        .route("/{appointment_id}/leave", post(handlers::leave_consultation))
        .route("/{appointment_id}/complete", put(handlers::complete_consultation))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}
