use async_trait::async_trait;
use reqwest::{header::HeaderValue, Method};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::AvailabilityTemplate;
use crate::services::template_store::{TemplateStore, TemplateStoreError};

const TABLE_PATH: &str = "/rest/v1/availability_templates";

/// Templates persisted in the `availability_templates` table, keyed by `doctor_id`.
pub struct SupabaseTemplateStore {
    supabase: SupabaseClient,
}

impl SupabaseTemplateStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl TemplateStore for SupabaseTemplateStore {
    async fn get(&self, doctor_id: Uuid) -> Result<Option<AvailabilityTemplate>, TemplateStoreError> {
        let path = format!("{}?doctor_id=eq.{}&limit=1", TABLE_PATH, doctor_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None, None).await?;

        match rows.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map(Some)
                .map_err(|e| TemplateStoreError::Corrupt(e.to_string())),
            None => Ok(None),
        }
    }

    async fn put(&self, template: AvailabilityTemplate) -> Result<AvailabilityTemplate, TemplateStoreError> {
        debug!("Upserting availability template for doctor {}", template.doctor_id);

        let mut headers = SupabaseClient::return_representation();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
        );

        let body = json!(template);
        let path = format!("{}?on_conflict=doctor_id", TABLE_PATH);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::POST, &path, None, Some(body), Some(headers))
            .await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| TemplateStoreError::Backend("Upsert returned no rows".to_string()))?;

        serde_json::from_value(row).map_err(|e| TemplateStoreError::Corrupt(e.to_string()))
    }
}
