#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use appointment_cell::models::{BookAppointmentRequest, BookingRules, ConsultationType};
use appointment_cell::services::{BookingLedger, InMemoryAppointmentStore, InMemoryProfileDirectory};
use consultation_cell::ConsultationSessionService;
use shared_models::auth::Actor;
use shared_utils::clock::FixedClock;

pub fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, hh, mm, 0).unwrap()
}

pub struct Harness {
    pub clock: Arc<FixedClock>,
    pub ledger: Arc<BookingLedger>,
    pub sessions: Arc<ConsultationSessionService>,
    pub doctor: Actor,
    pub patient: Actor,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(FixedClock::new(at(2025, 1, 1, 8, 0)));
        let ledger = Arc::new(BookingLedger::new(
            Arc::new(InMemoryAppointmentStore::new()),
            Arc::new(InMemoryProfileDirectory::new()),
            clock.clone(),
            BookingRules::default(),
        ));
        let sessions = Arc::new(ConsultationSessionService::new(ledger.clone()));

        Self {
            clock,
            ledger,
            sessions,
            doctor: Actor::doctor(Uuid::new_v4()),
            patient: Actor::patient(Uuid::new_v4()),
        }
    }

    /// Books 2025-01-06 09:00-09:30Z and moves the clock to its start.
    pub async fn booked_and_due(&self) -> Uuid {
        let start = at(2025, 1, 6, 9, 0);
        let request = BookAppointmentRequest {
            doctor_id: self.doctor.id,
            slot_start: start,
            slot_end: start + Duration::minutes(30),
            consultation_type: ConsultationType::Voice,
            symptoms: "Persistent dry cough at night".to_string(),
            consultation_fee: Some(400.0),
            platform_fee: Some(40.0),
            total_amount: Some(440.0),
        };
        let id = self.ledger.book(&self.patient, request).await.unwrap().appointment.id;
        self.clock.set(start);
        id
    }
}
