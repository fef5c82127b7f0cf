// libs/appointment-cell/src/services/supabase_store.rs
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{Appointment, AppointmentStatus, PaymentStatus, PaymentUpdate, StatusUpdate};
use crate::services::store::{AppointmentStore, StoreError};

const TABLE_PATH: &str = "/rest/v1/appointments";

/// Appointments in PostgREST. Double booking is refused by the database:
///
/// ```sql
/// create unique index appointments_doctor_slot_active
///     on appointments (doctor_id, slot_start) where status <> 'cancelled';
/// alter table appointments add constraint appointments_no_overlap
///     exclude using gist (doctor_id with =, tstzrange(slot_start, slot_end) with &&)
///     where (status <> 'cancelled');
/// ```
pub struct SupabaseAppointmentStore {
    supabase: SupabaseClient,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn select(&self, query: &str) -> Result<Vec<Appointment>, StoreError> {
        let path = format!("{}?{}", TABLE_PATH, query);
        Ok(self.supabase.request(Method::GET, &path, None, None).await?)
    }

    async fn patch_where(&self, query: &str, body: serde_json::Value) -> Result<Option<Appointment>, StoreError> {
        let path = format!("{}?{}", TABLE_PATH, query);
        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(body),
                Some(SupabaseClient::return_representation()),
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    urlencoding::encode(&at.to_rfc3339_opts(SecondsFormat::Millis, true)).into_owned()
}

fn status_filter(statuses: &[AppointmentStatus]) -> String {
    if statuses.is_empty() {
        return String::new();
    }
    let values: Vec<String> = statuses.iter().map(ToString::to_string).collect();
    format!("&status=in.({})", values.join(","))
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        debug!("Inserting appointment {} for doctor {}", appointment.id, appointment.doctor_id);

        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::POST,
                TABLE_PATH,
                None,
                Some(json!(appointment)),
                Some(SupabaseClient::return_representation()),
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("Insert returned no rows".to_string()))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.select(&format!("id=eq.{}&limit=1", id)).await?.into_iter().next())
    }

    async fn find_overlapping(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        self.select(&format!(
            "doctor_id=eq.{}&status=neq.cancelled&slot_start=lt.{}&slot_end=gt.{}&order=slot_start.asc",
            doctor_id,
            timestamp(end),
            timestamp(start)
        ))
        .await
    }

    async fn find_starting_between(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        self.select(&format!(
            "doctor_id=eq.{}&status=neq.cancelled&and=(slot_start.gte.{},slot_start.lt.{})&order=slot_start.asc",
            doctor_id,
            timestamp(from),
            timestamp(to)
        ))
        .await
    }

    async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>, StoreError> {
        self.select(&format!(
            "doctor_id=eq.{}{}&order=slot_start.asc",
            doctor_id,
            status_filter(statuses)
        ))
        .await
    }

    async fn list_for_patient(
        &self,
        patient_id: Uuid,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>, StoreError> {
        self.select(&format!(
            "patient_id=eq.{}{}&order=slot_start.asc",
            patient_id,
            status_filter(statuses)
        ))
        .await
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        update: StatusUpdate,
    ) -> Result<Option<Appointment>, StoreError> {
        self.patch_where(&format!("id=eq.{}&status=eq.{}", id, expected), json!(update))
            .await
    }

    async fn update_payment(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        update: PaymentUpdate,
    ) -> Result<Option<Appointment>, StoreError> {
        self.patch_where(&format!("id=eq.{}&payment_status=eq.{}", id, expected), json!(update))
            .await
    }
}
