// libs/consultation-cell/tests/session_test.rs
mod common;

use assert_matches::assert_matches;
use chrono::Duration;
use uuid::Uuid;

use appointment_cell::models::{AppointmentError, AppointmentStatus, CompleteConsultationRequest};
use shared_models::auth::Actor;

use common::{at, Harness};

fn prescription(text: &str) -> CompleteConsultationRequest {
    CompleteConsultationRequest {
        prescription: text.to_string(),
        notes: Some("  Review in one week ".to_string()),
    }
}

#[tokio::test]
async fn full_consultation_flow() {
    let h = Harness::new();
    let id = h.booked_and_due().await;

    let patient_view = h.sessions.on_room_joined(id, &h.patient).await.unwrap();
    assert_eq!(patient_view.status, AppointmentStatus::InProgress);
    assert_eq!(patient_view.started_at, Some(at(2025, 1, 6, 9, 0)));

    h.clock.advance(Duration::minutes(2));
    let doctor_view = h.sessions.on_room_joined(id, &h.doctor).await.unwrap();
    assert_eq!(doctor_view.room_token, patient_view.room_token);
    // The second join does not restart the consultation.
    assert_eq!(doctor_view.started_at, Some(at(2025, 1, 6, 9, 0)));

    let report = h.sessions.on_room_left(id, &h.patient).await.unwrap();
    assert!(report.awaiting_prescription);
    assert_eq!(report.status, AppointmentStatus::InProgress);

    let completed = h
        .sessions
        .complete(id, &h.doctor, prescription("Paracetamol 500mg twice daily"))
        .await
        .unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);
    assert_eq!(completed.prescription.as_deref(), Some("Paracetamol 500mg twice daily"));
    assert_eq!(completed.notes.as_deref(), Some("Review in one week"));
    assert_eq!(completed.completed_at, Some(at(2025, 1, 6, 9, 2)));

    let report = h.sessions.on_room_left(id, &h.doctor).await.unwrap();
    assert!(!report.awaiting_prescription);
    assert_eq!(report.status, AppointmentStatus::Completed);

    assert_matches!(
        h.sessions.on_room_joined(id, &h.patient).await,
        Err(AppointmentError::InvalidTransition(AppointmentStatus::Completed))
    );
}

#[tokio::test]
async fn leaving_before_anyone_joined_changes_nothing() {
    let h = Harness::new();
    let id = h.booked_and_due().await;

    let report = h.sessions.on_room_left(id, &h.doctor).await.unwrap();
    assert_eq!(report.status, AppointmentStatus::Scheduled);
    assert!(!report.awaiting_prescription);

    let still = h.ledger.get_appointment(id, &h.patient).await.unwrap().appointment;
    assert_eq!(still.status, AppointmentStatus::Scheduled);
    assert!(still.started_at.is_none());
}

#[tokio::test]
async fn only_the_booked_doctor_completes() {
    let h = Harness::new();
    let id = h.booked_and_due().await;
    h.sessions.on_room_joined(id, &h.doctor).await.unwrap();

    assert_matches!(
        h.sessions.complete(id, &h.patient, prescription("Rest")).await,
        Err(AppointmentError::Forbidden)
    );
    assert_matches!(
        h.sessions
            .complete(id, &Actor::doctor(Uuid::new_v4()), prescription("Rest"))
            .await,
        Err(AppointmentError::Forbidden)
    );
    assert_matches!(
        h.sessions.complete(id, &h.doctor, prescription("   ")).await,
        Err(AppointmentError::Validation(_))
    );

    let unchanged = h.ledger.get_appointment(id, &h.doctor).await.unwrap().appointment;
    assert_eq!(unchanged.status, AppointmentStatus::InProgress);
}

#[tokio::test]
async fn strangers_and_cancelled_bookings_are_refused() {
    let h = Harness::new();
    let id = h.booked_and_due().await;

    assert_matches!(
        h.sessions.on_room_joined(id, &Actor::patient(Uuid::new_v4())).await,
        Err(AppointmentError::Forbidden)
    );
    assert_matches!(
        h.sessions.on_room_left(id, &Actor::doctor(Uuid::new_v4())).await,
        Err(AppointmentError::Forbidden)
    );
    assert_matches!(
        h.sessions.on_room_joined(Uuid::new_v4(), &h.patient).await,
        Err(AppointmentError::NotFound)
    );

    // Cancel needs a future start, so rewind first.
    h.clock.set(at(2025, 1, 5, 9, 0));
    h.ledger.cancel(id, &h.patient).await.unwrap();

    assert_matches!(
        h.sessions.on_room_joined(id, &h.doctor).await,
        Err(AppointmentError::InvalidTransition(AppointmentStatus::Cancelled))
    );
    assert_matches!(
        h.sessions.complete(id, &h.doctor, prescription("Rest")).await,
        Err(AppointmentError::InvalidTransition(AppointmentStatus::Cancelled))
    );
}

#[tokio::test]
async fn completing_without_joining_is_allowed_from_scheduled() {
    let h = Harness::new();
    let id = h.booked_and_due().await;

    let completed = h
        .sessions
        .complete(id, &h.doctor, prescription("Steam inhalation"))
        .await
        .unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);
    assert!(completed.started_at.is_none());
}
