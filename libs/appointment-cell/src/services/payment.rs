// libs/appointment-cell/src/services/payment.rs
use std::sync::Arc;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::Actor;
use shared_utils::clock::Clock;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, PaymentOrder, PaymentProof, PaymentStatus,
    PaymentUpdate,
};
use crate::services::booking::storage_error;
use crate::services::store::AppointmentStore;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum PaymentGatewayError {
    #[error("Gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gateway rejected the order ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Minor currency units (paise for INR).
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

/// The external checkout provider. Only order creation is delegated; payment
/// proofs are verified locally with the shared key secret.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: OrderRequest) -> Result<GatewayOrder, PaymentGatewayError>;

    /// Public key handed to the client checkout.
    fn key_id(&self) -> &str;
}

/// Razorpay Orders API.
pub struct RazorpayGateway {
    client: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.razorpay_base_url.trim_end_matches('/').to_string(),
            key_id: config.razorpay_key_id.clone(),
            key_secret: config.razorpay_key_secret.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, request: OrderRequest) -> Result<GatewayOrder, PaymentGatewayError> {
        let url = format!("{}/orders", self.base_url);
        debug!("Creating gateway order {} for {} {}", request.receipt, request.amount, request.currency);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await?;
            error!("Gateway order creation failed ({}): {}", status, message);
            return Err(PaymentGatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<GatewayOrder>().await?)
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }
}

/// Issues order ids locally; for development without gateway credentials.
pub struct LocalOrderGateway {
    key_id: String,
}

impl LocalOrderGateway {
    pub fn new(key_id: impl Into<String>) -> Self {
        Self { key_id: key_id.into() }
    }
}

#[async_trait]
impl PaymentGateway for LocalOrderGateway {
    async fn create_order(&self, request: OrderRequest) -> Result<GatewayOrder, PaymentGatewayError> {
        Ok(GatewayOrder {
            id: format!("order_{}", Uuid::new_v4().simple()),
            amount: request.amount,
            currency: request.currency,
        })
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }
}

/// Checks `HMAC-SHA256(key_secret, "<order_id>|<payment_id>")` against the hex signature.
#[derive(Clone)]
pub struct PaymentVerifier {
    key_secret: String,
}

impl PaymentVerifier {
    pub fn new(key_secret: impl Into<String>) -> Self {
        Self {
            key_secret: key_secret.into(),
        }
    }

    fn mac(&self, order_id: &str, payment_id: &str) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.key_secret.as_bytes()).ok()?;
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        Some(mac)
    }

    pub fn sign(&self, order_id: &str, payment_id: &str) -> Option<String> {
        self.mac(order_id, payment_id)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
    }

    pub fn verify(&self, proof: &PaymentProof) -> bool {
        if self.key_secret.is_empty() {
            return false;
        }
        let Ok(signature) = hex::decode(proof.signature.trim()) else {
            return false;
        };
        match self.mac(&proof.order_id, &proof.payment_id) {
            Some(mac) => mac.verify_slice(&signature).is_ok(),
            None => false,
        }
    }
}

/// Payment bookkeeping on appointments. Never touches status or the slot.
pub struct PaymentService {
    store: Arc<dyn AppointmentStore>,
    gateway: Arc<dyn PaymentGateway>,
    verifier: PaymentVerifier,
    clock: Arc<dyn Clock>,
    currency: String,
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        gateway: Arc<dyn PaymentGateway>,
        verifier: PaymentVerifier,
        clock: Arc<dyn Clock>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            gateway,
            verifier,
            clock,
            currency: currency.into(),
        }
    }

    async fn payable(&self, appointment_id: Uuid, actor: &Actor) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .store
            .get(appointment_id)
            .await
            .map_err(storage_error)?
            .ok_or(AppointmentError::NotFound)?;

        if !(actor.is_patient() && appointment.is_party(actor)) {
            return Err(AppointmentError::Forbidden);
        }
        if appointment.payment_status == PaymentStatus::Paid {
            return Err(AppointmentError::AlreadyPaid);
        }
        if appointment.status == AppointmentStatus::Cancelled {
            return Err(AppointmentError::InvalidTransition(appointment.status));
        }
        Ok(appointment)
    }

    pub async fn create_payment_order(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
    ) -> Result<PaymentOrder, AppointmentError> {
        let appointment = self.payable(appointment_id, actor).await?;

        let request = OrderRequest {
            amount: (appointment.total_amount * 100.0).round() as i64,
            currency: self.currency.clone(),
            receipt: format!("appointment_{}", appointment.id),
            notes: json!({
                "appointment_id": appointment.id,
                "consultation_type": appointment.consultation_type,
                "slot_start": appointment.slot_start,
                "slot_end": appointment.slot_end,
            }),
        };

        let order = self
            .gateway
            .create_order(request)
            .await
            .map_err(|e| AppointmentError::Gateway(e.to_string()))?;

        let update = PaymentUpdate {
            payment_status: PaymentStatus::Pending,
            payment_order_id: Some(order.id.clone()),
            payment_id: None,
            payment_signature: None,
            paid_at: None,
            payment_method: None,
            updated_at: self.clock.now(),
        };
        self.store
            .update_payment(appointment.id, PaymentStatus::Pending, update)
            .await
            .map_err(storage_error)?
            .ok_or(AppointmentError::AlreadyPaid)?;

        info!("Payment order {} created for appointment {}", order.id, appointment.id);
        Ok(PaymentOrder {
            order_id: order.id,
            amount: appointment.total_amount,
            currency: order.currency,
            key_id: self.gateway.key_id().to_string(),
        })
    }

    /// Flips the appointment to paid once the gateway's proof checks out.
    pub async fn mark_paid(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
        proof: PaymentProof,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.payable(appointment_id, actor).await?;

        if appointment.payment_order_id.as_deref() != Some(proof.order_id.as_str()) {
            warn!(
                "Payment proof for appointment {} names unknown order {}",
                appointment.id, proof.order_id
            );
            return Err(AppointmentError::VerificationFailed);
        }
        if !self.verifier.verify(&proof) {
            warn!("Payment signature mismatch for appointment {}", appointment.id);
            return Err(AppointmentError::VerificationFailed);
        }

        let now = self.clock.now();
        let update = PaymentUpdate {
            payment_status: PaymentStatus::Paid,
            payment_order_id: None,
            payment_id: Some(proof.payment_id),
            payment_signature: Some(proof.signature),
            paid_at: Some(now),
            payment_method: Some("online".to_string()),
            updated_at: now,
        };

        let paid = self
            .store
            .update_payment(appointment.id, PaymentStatus::Pending, update)
            .await
            .map_err(storage_error)?
            .ok_or(AppointmentError::AlreadyPaid)?;

        info!("Appointment {} marked paid", paid.id);
        Ok(paid)
    }
}
