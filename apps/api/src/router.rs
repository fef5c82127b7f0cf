use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::info;

use appointment_cell::handlers::AppointmentState;
use appointment_cell::models::BookingRules;
use appointment_cell::router::appointment_routes;
use appointment_cell::services::{
    AppointmentStore, BookingLedger, InMemoryAppointmentStore, InMemoryProfileDirectory, LocalOrderGateway,
    PaymentGateway, PaymentService, PaymentVerifier, ProfileDirectory, RazorpayGateway, SlotQueryService,
    SupabaseAppointmentStore, SupabaseProfileDirectory,
};
use consultation_cell::handlers::ConsultationState;
use consultation_cell::router::consultation_routes;
use consultation_cell::ConsultationSessionService;
use doctor_cell::handlers::DoctorState;
use doctor_cell::router::doctor_routes;
use doctor_cell::{AvailabilityService, InMemoryTemplateStore, SupabaseTemplateStore, TemplateStore};
use shared_config::{AppConfig, StorageBackend};
use shared_utils::clock::{Clock, SystemClock};

pub fn create_router(config: Arc<AppConfig>) -> Router {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let templates: Arc<dyn TemplateStore>;
    let appointments: Arc<dyn AppointmentStore>;
    let directory: Arc<dyn ProfileDirectory>;
    match config.storage_backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on restart");
            templates = Arc::new(InMemoryTemplateStore::new());
            appointments = Arc::new(InMemoryAppointmentStore::new());
            directory = Arc::new(InMemoryProfileDirectory::new());
        }
        StorageBackend::Supabase => {
            info!("Using Supabase storage at {}", config.supabase_url);
            templates = Arc::new(SupabaseTemplateStore::new(&config));
            appointments = Arc::new(SupabaseAppointmentStore::new(&config));
            directory = Arc::new(SupabaseProfileDirectory::new(&config));
        }
    }

    let gateway: Arc<dyn PaymentGateway> = if config.is_payment_gateway_configured() {
        Arc::new(RazorpayGateway::new(&config))
    } else {
        info!("Razorpay not configured, issuing local payment orders");
        Arc::new(LocalOrderGateway::new(config.razorpay_key_id.clone()))
    };

    let availability = Arc::new(AvailabilityService::new(templates));
    let ledger = Arc::new(BookingLedger::new(
        appointments.clone(),
        directory,
        clock.clone(),
        BookingRules::from(config.as_ref()),
    ));
    let slots = Arc::new(SlotQueryService::new(availability.clone(), ledger.clone()));
    let payments = Arc::new(PaymentService::new(
        appointments,
        gateway,
        PaymentVerifier::new(config.razorpay_key_secret.clone()),
        clock,
        config.payment_currency.clone(),
    ));
    let sessions = Arc::new(ConsultationSessionService::new(ledger.clone()));

    let doctor_state = Arc::new(DoctorState {
        config: config.clone(),
        availability,
    });
    let appointment_state = Arc::new(AppointmentState {
        config: config.clone(),
        ledger,
        slots,
        payments,
    });
    let consultation_state = Arc::new(ConsultationState {
        config: config.clone(),
        sessions,
    });

    Router::new()
        .route("/", get(|| async { "Telecare API is running!" }))
        .route("/health", get(health_check))
        .nest("/doctors", doctor_routes(doctor_state))
        .nest("/appointments", appointment_routes(appointment_state))
        .nest("/consultations", consultation_routes(consultation_state))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "telecare-api"
    }))
}
