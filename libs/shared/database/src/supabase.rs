use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// SQLSTATE raised by a unique index.
pub const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE raised by an exclusion constraint (e.g. overlapping ranges).
pub const EXCLUSION_VIOLATION: &str = "23P01";
/// SQLSTATE raised when a row references a missing parent.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Constraint violation ({code}): {message}")]
    ConstraintViolation { code: String, message: String },

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DatabaseError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, DatabaseError::ConstraintViolation { .. })
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            service_key: config.supabase_service_role_key.clone(),
        }
    }

    /// Server-side calls authenticate with the service key when one is configured,
    /// otherwise with the anon key.
    fn server_key(&self) -> &str {
        if self.service_key.is_empty() {
            &self.anon_key
        } else {
            &self.service_key
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, DatabaseError> {
        let mut headers = HeaderMap::new();

        let api_key = if self.anon_key.is_empty() { self.server_key() } else { &self.anon_key };
        headers.insert("apikey", header_value(api_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let bearer = auth_token.unwrap_or_else(|| self.server_key());
        if !bearer.is_empty() {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", bearer))?);
        }

        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);
            return Err(classify_error(status, &error_text));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            // PostgREST answers 204 without a body unless asked for a representation.
            return Ok(serde_json::from_value(Value::Null)?);
        }

        Ok(serde_json::from_slice::<T>(&bytes)?)
    }

    /// Header asking PostgREST to echo the written rows back.
    pub fn return_representation() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, DatabaseError> {
    HeaderValue::from_str(raw).map_err(|e| DatabaseError::InvalidHeader(e.to_string()))
}

fn classify_error(status: StatusCode, error_text: &str) -> DatabaseError {
    let body: Option<PostgrestErrorBody> = serde_json::from_str(error_text).ok();
    let code = body.as_ref().and_then(|b| b.code.clone());
    let message = body
        .as_ref()
        .and_then(|b| b.message.clone().or_else(|| b.details.clone()))
        .unwrap_or_else(|| error_text.to_string());

    match (status.as_u16(), code.as_deref()) {
        (_, Some(code)) if code == UNIQUE_VIOLATION || code == EXCLUSION_VIOLATION => {
            DatabaseError::ConstraintViolation { code: code.to_string(), message }
        }
        (_, Some(FOREIGN_KEY_VIOLATION)) => DatabaseError::ForeignKeyViolation(message),
        (401 | 403, _) => DatabaseError::Auth(message),
        (404, _) => DatabaseError::NotFound(message),
        (status, _) => DatabaseError::Api { status, message },
    }
}
