// libs/appointment-cell/tests/router_test.rs
mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::handlers::AppointmentState;
use appointment_cell::router::appointment_routes;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

use common::Harness;

struct TestApp {
    router: Router,
    config: TestConfig,
    doctor: TestUser,
    patient: TestUser,
}

impl TestApp {
    async fn new() -> Self {
        let h = Harness::new().await.with_january_template().await;
        let config = TestConfig::default();

        let doctor = TestUser::with_id(h.doctor.id, "doctor@example.com", "doctor");
        let patient = TestUser::with_id(h.patient.id, "patient@example.com", "patient");

        let state = Arc::new(AppointmentState {
            config: config.to_arc(),
            ledger: h.ledger.clone(),
            slots: h.slots.clone(),
            payments: h.payments.clone(),
        });

        Self {
            router: appointment_routes(state),
            config,
            doctor,
            patient,
        }
    }

    async fn send(&self, method: Method, uri: &str, user: Option<&TestUser>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("Authorization", JwtTestUtils::bearer(user, &self.config.jwt_secret));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn booking_body(doctor_id: &str) -> Value {
    json!({
        "doctor_id": doctor_id,
        "slot_start": "2025-01-06T09:00:00Z",
        "slot_end": "2025-01-06T09:30:00Z",
        "consultation_type": "Video Consultation",
        "symptoms": "Fever and sore throat for three days",
        "consultation_fee": 500,
        "platform_fee": 50,
        "total_amount": 550
    })
}

#[tokio::test]
async fn slots_are_public_and_shrink_after_booking() {
    let app = TestApp::new().await;
    let slots_uri = format!("/slots/{}/2025-01-06", app.doctor.id);

    let response = app.send(Method::GET, &slots_uri, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["available_slots"].as_array().unwrap().len(), 6);

    let response = app
        .send(Method::POST, "/", Some(&app.patient), Some(booking_body(&app.doctor.id)))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let booked = json_body(response).await;
    assert_eq!(booked["status"], "scheduled");
    assert_eq!(booked["consultation_type"], "video");
    assert_eq!(booked["doctor"]["name"], "Dr. Asha Rao");

    let response = app.send(Method::GET, &slots_uri, None, None).await;
    let slots = json_body(response).await;
    assert_eq!(slots["available_slots"].as_array().unwrap().len(), 5);
    assert_eq!(slots["available_slots"][0]["start_time"], "2025-01-06T09:30:00Z");

    let response = app
        .send(Method::GET, &format!("/booked-slots/{}/2025-01-06", app.doctor.id), None, None)
        .await;
    assert_eq!(json_body(response).await["booked_start_times"], json!(["2025-01-06T09:00:00Z"]));
}

#[tokio::test]
async fn last_representable_date_is_a_bad_request() {
    let app = TestApp::new().await;

    for prefix in ["slots", "booked-slots"] {
        let uri = format!("/{}/{}/+262142-12-31", prefix, app.doctor.id);
        let response = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(json_body(response).await["kind"], "validation_error");
    }
}

#[tokio::test]
async fn double_booking_is_a_conflict() {
    let app = TestApp::new().await;
    let rival = TestUser::patient("rival@example.com");

    let first = app
        .send(Method::POST, "/", Some(&app.patient), Some(booking_body(&app.doctor.id)))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .send(Method::POST, "/", Some(&rival), Some(booking_body(&app.doctor.id)))
        .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(second).await["kind"], "conflict");
}

#[tokio::test]
async fn malformed_booking_is_a_bad_request() {
    let app = TestApp::new().await;
    let mut body = booking_body(&app.doctor.id);
    body["symptoms"] = json!("cough");

    let response = app.send(Method::POST, "/", Some(&app.patient), Some(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["kind"], "validation_error");
}

#[tokio::test]
async fn booking_requires_authentication() {
    let app = TestApp::new().await;
    let response = app
        .send(Method::POST, "/", None, Some(booking_body(&app.doctor.id)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cancel_by_a_stranger_is_forbidden_then_owner_succeeds() {
    let app = TestApp::new().await;
    let booked = json_body(
        app.send(Method::POST, "/", Some(&app.patient), Some(booking_body(&app.doctor.id)))
            .await,
    )
    .await;
    let id = booked["id"].as_str().unwrap();
    let cancel_uri = format!("/{}/cancel", id);

    let stranger = TestUser::patient("stranger@example.com");
    let response = app.send(Method::POST, &cancel_uri, Some(&stranger), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.send(Method::POST, &cancel_uri, Some(&app.patient), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "cancelled");

    let response = app.send(Method::POST, &cancel_uri, Some(&app.patient), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn listings_and_lookup() {
    let app = TestApp::new().await;
    let booked = json_body(
        app.send(Method::POST, "/", Some(&app.patient), Some(booking_body(&app.doctor.id)))
            .await,
    )
    .await;
    let id = booked["id"].as_str().unwrap();

    let response = app
        .send(Method::GET, "/doctor?status=scheduled", Some(&app.doctor), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["total"], 1);

    let response = app
        .send(Method::GET, "/patient?status=completed", Some(&app.patient), None)
        .await;
    assert_eq!(json_body(response).await["total"], 0);

    let response = app
        .send(Method::GET, "/patient?status=completed,scheduled", Some(&app.patient), None)
        .await;
    assert_eq!(json_body(response).await["total"], 1);

    let response = app
        .send(Method::GET, "/patient?status=scheduled,unknown", Some(&app.patient), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.send(Method::GET, &format!("/{}", id), Some(&app.doctor), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["patient"]["name"], "Ravi Kumar");

    let response = app
        .send(Method::GET, &format!("/{}", Uuid::new_v4()), Some(&app.doctor), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .send(Method::GET, &format!("/{}/join-eligibility", id), Some(&app.patient), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["can_join"], false);
}

#[tokio::test]
async fn payment_endpoints_round_trip() {
    let app = TestApp::new().await;
    let booked = json_body(
        app.send(Method::POST, "/", Some(&app.patient), Some(booking_body(&app.doctor.id)))
            .await,
    )
    .await;
    let id = booked["id"].as_str().unwrap();

    let response = app
        .send(Method::POST, &format!("/{}/payment/order", id), Some(&app.patient), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let order = json_body(response).await;
    let order_id = order["order_id"].as_str().unwrap().to_string();

    let signature = appointment_cell::services::PaymentVerifier::new(common::KEY_SECRET)
        .sign(&order_id, "pay_777")
        .unwrap();

    let response = app
        .send(
            Method::POST,
            &format!("/{}/payment/verify", id),
            Some(&app.patient),
            Some(json!({
                "razorpay_order_id": order_id,
                "razorpay_payment_id": "pay_777",
                "razorpay_signature": "00".repeat(32)
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(
            Method::POST,
            &format!("/{}/payment/verify", id),
            Some(&app.patient),
            Some(json!({
                "razorpay_order_id": order_id,
                "razorpay_payment_id": "pay_777",
                "razorpay_signature": signature
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["payment_status"], "paid");
}
