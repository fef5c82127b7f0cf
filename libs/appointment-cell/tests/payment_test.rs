// libs/appointment-cell/tests/payment_test.rs
mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{AppointmentError, AppointmentStatus, PaymentProof, PaymentStatus};
use appointment_cell::services::{PaymentVerifier, RazorpayGateway};
use shared_models::auth::Actor;
use shared_utils::test_utils::TestConfig;

use common::{at, Harness, KEY_ID, KEY_SECRET};

fn signed_proof(order_id: &str, payment_id: &str) -> PaymentProof {
    PaymentProof {
        order_id: order_id.to_string(),
        payment_id: payment_id.to_string(),
        signature: PaymentVerifier::new(KEY_SECRET).sign(order_id, payment_id).unwrap(),
    }
}

#[tokio::test]
async fn order_then_verified_payment_marks_paid() {
    let h = Harness::new().await;
    let booked = h
        .ledger
        .book(&h.patient, h.booking(at(2025, 1, 6, 9, 0), 30))
        .await
        .unwrap();
    let id = booked.appointment.id;

    let order = h.payments.create_payment_order(id, &h.patient).await.unwrap();
    assert!(order.order_id.starts_with("order_"));
    assert_eq!(order.amount, 550.0);
    assert_eq!(order.currency, "INR");
    assert_eq!(order.key_id, KEY_ID);

    let paid = h
        .payments
        .mark_paid(id, &h.patient, signed_proof(&order.order_id, "pay_123"))
        .await
        .unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.payment_id.as_deref(), Some("pay_123"));
    assert_eq!(paid.payment_order_id.as_deref(), Some(order.order_id.as_str()));
    assert_eq!(paid.paid_at, Some(at(2025, 1, 1, 8, 0)));
    // Payment never touches the lifecycle.
    assert_eq!(paid.status, AppointmentStatus::Scheduled);

    assert_matches!(
        h.payments
            .mark_paid(id, &h.patient, signed_proof(&order.order_id, "pay_123"))
            .await,
        Err(AppointmentError::AlreadyPaid)
    );
    assert_matches!(
        h.payments.create_payment_order(id, &h.patient).await,
        Err(AppointmentError::AlreadyPaid)
    );
}

#[tokio::test]
async fn bad_proofs_leave_the_booking_pending() {
    let h = Harness::new().await;
    let id = h
        .ledger
        .book(&h.patient, h.booking(at(2025, 1, 6, 9, 0), 30))
        .await
        .unwrap()
        .appointment
        .id;

    // No order created yet.
    assert_matches!(
        h.payments.mark_paid(id, &h.patient, signed_proof("order_x", "pay_1")).await,
        Err(AppointmentError::VerificationFailed)
    );

    let order = h.payments.create_payment_order(id, &h.patient).await.unwrap();

    let mut forged = signed_proof(&order.order_id, "pay_1");
    forged.signature = PaymentVerifier::new("wrong").sign(&order.order_id, "pay_1").unwrap();
    assert_matches!(
        h.payments.mark_paid(id, &h.patient, forged).await,
        Err(AppointmentError::VerificationFailed)
    );

    assert_matches!(
        h.payments
            .mark_paid(id, &h.patient, signed_proof("order_someone_else", "pay_1"))
            .await,
        Err(AppointmentError::VerificationFailed)
    );

    let still = h.ledger.get_appointment(id, &h.patient).await.unwrap().appointment;
    assert_eq!(still.payment_status, PaymentStatus::Pending);

    // A retry with a good proof still goes through.
    assert!(h
        .payments
        .mark_paid(id, &h.patient, signed_proof(&order.order_id, "pay_2"))
        .await
        .is_ok());
}

#[tokio::test]
async fn only_the_booking_patient_pays_and_not_for_cancelled() {
    let h = Harness::new().await;
    let id = h
        .ledger
        .book(&h.patient, h.booking(at(2025, 1, 6, 9, 0), 30))
        .await
        .unwrap()
        .appointment
        .id;

    assert_matches!(
        h.payments.create_payment_order(id, &h.doctor).await,
        Err(AppointmentError::Forbidden)
    );
    assert_matches!(
        h.payments.create_payment_order(id, &Actor::patient(Uuid::new_v4())).await,
        Err(AppointmentError::Forbidden)
    );

    h.ledger.cancel(id, &h.patient).await.unwrap();
    assert_matches!(
        h.payments.create_payment_order(id, &h.patient).await,
        Err(AppointmentError::InvalidTransition(AppointmentStatus::Cancelled))
    );
}

#[tokio::test]
async fn razorpay_orders_are_created_in_minor_units() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(header_exists("Authorization"))
        .and(body_partial_json(json!({"amount": 55050, "currency": "INR"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_rzp_42",
            "entity": "order",
            "amount": 55050,
            "currency": "INR",
            "status": "created"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = TestConfig::default().to_app_config();
    config.razorpay_base_url = server.uri();
    let h = Harness::with_gateway(Arc::new(RazorpayGateway::new(&config))).await;

    let mut request = h.booking(at(2025, 1, 6, 9, 0), 30);
    request.consultation_fee = Some(500.5);
    request.total_amount = Some(550.5);
    let id = h.ledger.book(&h.patient, request).await.unwrap().appointment.id;

    let order = h.payments.create_payment_order(id, &h.patient).await.unwrap();
    assert_eq!(order.order_id, "order_rzp_42");
    assert_eq!(order.amount, 550.5);
    assert_eq!(order.key_id, "rzp_test_key");
}

#[tokio::test]
async fn gateway_rejection_is_a_gateway_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": "BAD_REQUEST_ERROR", "description": "Authentication failed"}
        })))
        .mount(&server)
        .await;

    let mut config = TestConfig::default().to_app_config();
    config.razorpay_base_url = server.uri();
    let h = Harness::with_gateway(Arc::new(RazorpayGateway::new(&config))).await;
    let id = h
        .ledger
        .book(&h.patient, h.booking(at(2025, 1, 6, 9, 0), 30))
        .await
        .unwrap()
        .appointment
        .id;

    assert_matches!(
        h.payments.create_payment_order(id, &h.patient).await,
        Err(AppointmentError::Gateway(_))
    );
    let untouched = h.ledger.get_appointment(id, &h.patient).await.unwrap().appointment;
    assert!(untouched.payment_order_id.is_none());
}
