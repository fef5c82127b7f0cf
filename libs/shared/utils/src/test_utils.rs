//! Fixtures shared by the cell test suites: a config with known secrets,
//! users with fixed ids, and HS256 tokens the auth middleware accepts.
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Actor, JwtClaims, JwtHeader, User};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            razorpay_key_id: "rzp_test_key".to_string(),
            razorpay_key_secret: "rzp_test_secret".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            razorpay_key_id: self.razorpay_key_id.clone(),
            razorpay_key_secret: self.razorpay_key_secret.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Token subject. `id` stays a string so malformed subjects can be tested too.
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", "patient")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self::with_id(Uuid::new_v4(), email, role)
    }

    /// Matches a token to an actor already seeded in a store.
    pub fn with_id(id: Uuid, email: &str, role: &str) -> Self {
        Self {
            id: id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    /// Panics for roles the ledger does not model; test helper only.
    pub fn to_actor(&self) -> Actor {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: None,
        }
        .actor()
        .expect("test user must be a patient or doctor with a UUID id")
    }

    fn claims(&self, expires_in: Duration) -> JwtClaims {
        let now = Utc::now();
        JwtClaims {
            sub: self.id.clone(),
            exp: Some((now + expires_in).timestamp().max(0) as u64),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            user_metadata: None,
            aud: Some("authenticated".to_string()),
            iat: Some(now.timestamp().max(0) as u64),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    fn encode<T: serde::Serialize>(value: &T) -> String {
        let json = serde_json::to_vec(value).expect("test token segment serializes");
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Signs `user` with HS256. `exp_hours` defaults to a day; negative values mint an expired token.
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let header = JwtHeader {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };
        let claims = user.claims(Duration::hours(exp_hours.unwrap_or(24)));
        let signing_input = format!("{}.{}", Self::encode(&header), Self::encode(&claims));

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", signing_input, signature)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn bearer(user: &TestUser, secret: &str) -> String {
        format!("Bearer {}", Self::create_test_token(user, secret, None))
    }
}
