use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{DoctorSummary, PatientSummary};
use crate::services::store::StoreError;

/// Read-only source of display names for booking results.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn doctor_summary(&self, doctor_id: Uuid) -> Result<Option<DoctorSummary>, StoreError>;

    async fn patient_summary(&self, patient_id: Uuid) -> Result<Option<PatientSummary>, StoreError>;
}

#[derive(Default)]
pub struct InMemoryProfileDirectory {
    doctors: RwLock<HashMap<Uuid, DoctorSummary>>,
    patients: RwLock<HashMap<Uuid, PatientSummary>>,
}

impl InMemoryProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_doctor(&self, summary: DoctorSummary) {
        self.doctors.write().await.insert(summary.id, summary);
    }

    pub async fn add_patient(&self, summary: PatientSummary) {
        self.patients.write().await.insert(summary.id, summary);
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryProfileDirectory {
    async fn doctor_summary(&self, doctor_id: Uuid) -> Result<Option<DoctorSummary>, StoreError> {
        Ok(self.doctors.read().await.get(&doctor_id).cloned())
    }

    async fn patient_summary(&self, patient_id: Uuid) -> Result<Option<PatientSummary>, StoreError> {
        Ok(self.patients.read().await.get(&patient_id).cloned())
    }
}

#[derive(Debug, Deserialize)]
struct DoctorRow {
    id: Uuid,
    full_name: Option<String>,
    specialty: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PatientRow {
    id: Uuid,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
}

/// Profiles from the `doctors` and `patients` tables.
pub struct SupabaseProfileDirectory {
    supabase: SupabaseClient,
}

impl SupabaseProfileDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl ProfileDirectory for SupabaseProfileDirectory {
    async fn doctor_summary(&self, doctor_id: Uuid) -> Result<Option<DoctorSummary>, StoreError> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select=id,full_name,specialty", doctor_id);
        let rows: Vec<DoctorRow> = self.supabase.request(Method::GET, &path, None, None).await?;

        Ok(rows.into_iter().next().map(|row| DoctorSummary {
            id: row.id,
            name: row.full_name.unwrap_or_default(),
            specialization: row.specialty,
        }))
    }

    async fn patient_summary(&self, patient_id: Uuid) -> Result<Option<PatientSummary>, StoreError> {
        let path = format!(
            "/rest/v1/patients?id=eq.{}&select=id,first_name,last_name,email",
            patient_id
        );
        let rows: Vec<PatientRow> = self.supabase.request(Method::GET, &path, None, None).await?;

        Ok(rows.into_iter().next().map(|row| {
            let name = [row.first_name, row.last_name]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            PatientSummary {
                id: row.id,
                name,
                email: row.email,
            }
        }))
    }
}
