use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    Supabase,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "memory" | "in_memory" => Ok(StorageBackend::Memory),
            "supabase" | "postgrest" => Ok(StorageBackend::Supabase),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub storage_backend: StorageBackend,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub razorpay_base_url: String,
    pub payment_currency: String,
    pub min_symptoms_length: usize,
    pub join_window_before_minutes: i64,
    pub join_window_after_minutes: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            storage_backend: StorageBackend::Memory,
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_role_key: String::new(),
            supabase_jwt_secret: String::new(),
            razorpay_key_id: String::new(),
            razorpay_key_secret: String::new(),
            razorpay_base_url: "https://api.razorpay.com/v1".to_string(),
            payment_currency: "INR".to_string(),
            min_symptoms_length: 10,
            join_window_before_minutes: 15,
            join_window_after_minutes: 120,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr),
            storage_backend: env_parsed("STORAGE_BACKEND", defaults.storage_backend),
            supabase_url: env_or("SUPABASE_URL", defaults.supabase_url),
            supabase_anon_key: env_or("SUPABASE_ANON_PUBLIC_KEY", defaults.supabase_anon_key),
            supabase_service_role_key: env_or(
                "SUPABASE_SERVICE_ROLE_KEY",
                defaults.supabase_service_role_key,
            ),
            supabase_jwt_secret: env_or("SUPABASE_JWT_SECRET", defaults.supabase_jwt_secret),
            razorpay_key_id: env_or("RAZORPAY_KEY_ID", defaults.razorpay_key_id),
            razorpay_key_secret: env_or("RAZORPAY_KEY_SECRET", defaults.razorpay_key_secret),
            razorpay_base_url: env_or("RAZORPAY_BASE_URL", defaults.razorpay_base_url),
            payment_currency: env_or("PAYMENT_CURRENCY", defaults.payment_currency),
            min_symptoms_length: env_parsed("MIN_SYMPTOMS_LENGTH", defaults.min_symptoms_length),
            join_window_before_minutes: env_parsed(
                "JOIN_WINDOW_BEFORE_MINUTES",
                defaults.join_window_before_minutes,
            ),
            join_window_after_minutes: env_parsed(
                "JOIN_WINDOW_AFTER_MINUTES",
                defaults.join_window_after_minutes,
            ),
        };

        if !config.is_auth_configured() {
            warn!("SUPABASE_JWT_SECRET missing - every authenticated route will reject requests");
        }
        if config.storage_backend == StorageBackend::Supabase && !config.is_supabase_configured() {
            warn!("Supabase storage selected but SUPABASE_URL or keys are missing");
        }

        config
    }

    pub fn is_auth_configured(&self) -> bool {
        !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && (!self.supabase_service_role_key.is_empty() || !self.supabase_anon_key.is_empty())
    }

    pub fn is_payment_gateway_configured(&self) -> bool {
        !self.razorpay_key_id.is_empty()
            && !self.razorpay_key_secret.is_empty()
            && !self.razorpay_base_url.is_empty()
    }
}

fn env_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or_else(|_| {
        if default.is_empty() {
            warn!("{} not set, using empty value", key);
        } else {
            warn!("{} not set, using default", key);
        }
        default
    })
}

fn env_parsed<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
