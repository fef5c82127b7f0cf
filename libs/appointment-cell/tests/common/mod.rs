#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use appointment_cell::models::{BookAppointmentRequest, BookingRules, ConsultationType, DoctorSummary, PatientSummary};
use appointment_cell::services::{
    AppointmentStore, BookingLedger, InMemoryAppointmentStore, InMemoryProfileDirectory, LocalOrderGateway,
    PaymentGateway, PaymentService, PaymentVerifier, SlotQueryService,
};
use doctor_cell::models::{DailyWindow, UpsertAvailabilityRequest};
use doctor_cell::{AvailabilityService, InMemoryTemplateStore};
use shared_models::auth::Actor;
use shared_utils::clock::FixedClock;

pub const KEY_ID: &str = "rzp_test_key";
pub const KEY_SECRET: &str = "rzp_test_secret";

pub fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, hh, mm, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A fully wired in-memory ledger with one doctor whose clock starts on 2025-01-01 08:00Z.
pub struct Harness {
    pub clock: Arc<FixedClock>,
    pub store: Arc<InMemoryAppointmentStore>,
    pub directory: Arc<InMemoryProfileDirectory>,
    pub availability: Arc<AvailabilityService>,
    pub ledger: Arc<BookingLedger>,
    pub slots: Arc<SlotQueryService>,
    pub payments: Arc<PaymentService>,
    pub doctor: Actor,
    pub patient: Actor,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_gateway(Arc::new(LocalOrderGateway::new(KEY_ID))).await
    }

    pub async fn with_gateway(gateway: Arc<dyn PaymentGateway>) -> Self {
        let clock = Arc::new(FixedClock::new(at(2025, 1, 1, 8, 0)));
        let store = Arc::new(InMemoryAppointmentStore::new());
        let directory = Arc::new(InMemoryProfileDirectory::new());
        let availability = Arc::new(AvailabilityService::new(Arc::new(InMemoryTemplateStore::new())));

        let ledger = Arc::new(BookingLedger::new(
            store.clone() as Arc<dyn AppointmentStore>,
            directory.clone(),
            clock.clone(),
            BookingRules::default(),
        ));
        let slots = Arc::new(SlotQueryService::new(availability.clone(), ledger.clone()));
        let payments = Arc::new(PaymentService::new(
            store.clone(),
            gateway,
            PaymentVerifier::new(KEY_SECRET),
            clock.clone(),
            "INR",
        ));

        let doctor = Actor::doctor(Uuid::new_v4());
        let patient = Actor::patient(Uuid::new_v4());

        directory
            .add_doctor(DoctorSummary {
                id: doctor.id,
                name: "Dr. Asha Rao".to_string(),
                specialization: Some("General Medicine".to_string()),
            })
            .await;
        directory
            .add_patient(PatientSummary {
                id: patient.id,
                name: "Ravi Kumar".to_string(),
                email: Some("ravi@example.com".to_string()),
            })
            .await;

        Self {
            clock,
            store,
            directory,
            availability,
            ledger,
            slots,
            payments,
            doctor,
            patient,
        }
    }

    /// January 2025, Sundays off, 09:00-12:00 in 30 minute slots.
    pub async fn with_january_template(self) -> Self {
        self.availability
            .set_template(
                &self.doctor,
                UpsertAvailabilityRequest {
                    valid_from: date(2025, 1, 1),
                    valid_until: date(2025, 1, 31),
                    excluded_weekdays: BTreeSet::from([0]),
                    daily_windows: vec![DailyWindow::parse("09:00", "12:00").unwrap()],
                    slot_duration_minutes: 30,
                    utc_offset_minutes: None,
                },
            )
            .await
            .unwrap();
        self
    }

    pub fn booking(&self, start: DateTime<Utc>, minutes: i64) -> BookAppointmentRequest {
        booking_for(self.doctor.id, start, minutes)
    }
}

pub fn booking_for(doctor_id: Uuid, start: DateTime<Utc>, minutes: i64) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id,
        slot_start: start,
        slot_end: start + Duration::minutes(minutes),
        consultation_type: ConsultationType::Video,
        symptoms: "Fever and sore throat for three days".to_string(),
        consultation_fee: Some(500.0),
        platform_fee: Some(50.0),
        total_amount: Some(550.0),
    }
}
