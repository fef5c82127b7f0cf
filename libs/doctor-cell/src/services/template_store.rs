use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::DatabaseError;

use crate::models::AvailabilityTemplate;

#[derive(Debug, Error)]
pub enum TemplateStoreError {
    #[error("Template storage failed: {0}")]
    Backend(String),

    #[error("Stored template could not be decoded: {0}")]
    Corrupt(String),
}

impl From<DatabaseError> for TemplateStoreError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::Decode(inner) => TemplateStoreError::Corrupt(inner.to_string()),
            other => TemplateStoreError::Backend(other.to_string()),
        }
    }
}

/// One template per doctor; `put` replaces whatever was there.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn get(&self, doctor_id: Uuid) -> Result<Option<AvailabilityTemplate>, TemplateStoreError>;

    async fn put(&self, template: AvailabilityTemplate) -> Result<AvailabilityTemplate, TemplateStoreError>;
}

#[derive(Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<HashMap<Uuid, AvailabilityTemplate>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn get(&self, doctor_id: Uuid) -> Result<Option<AvailabilityTemplate>, TemplateStoreError> {
        Ok(self.templates.read().await.get(&doctor_id).cloned())
    }

    async fn put(&self, template: AvailabilityTemplate) -> Result<AvailabilityTemplate, TemplateStoreError> {
        self.templates
            .write()
            .await
            .insert(template.doctor_id, template.clone());
        Ok(template)
    }
}
