// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, AppointmentState};

pub fn appointment_routes(state: Arc<AppointmentState>) -> Router {
    // Slot lookups are public so the booking page can render before sign-in
    let public_routes = Router::new()
        .route("/slots/{doctor_id}/{date}", get(handlers::get_available_slots))
        .route("/booked-slots/{doctor_id}/{date}", get(handlers::get_booked_slots));

    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/doctor", get(handlers::get_doctor_appointments))
        .route("/patient", get(handlers::get_patient_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/join-eligibility", get(handlers::get_join_eligibility))
        .route("/{appointment_id}/payment/order", post(handlers::create_payment_order))
        .route("/{appointment_id}/payment/verify", post(handlers::verify_payment))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
