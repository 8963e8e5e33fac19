#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use uuid::Uuid;

use keycloak_guard::config::KeycloakConfig;
use keycloak_guard::services::auth::{UserProvider, UserRecord, UserStoreError};

pub const REALM_PUBLIC_PEM: &str = include_str!("../fixtures/realm_public.pem");
pub const REALM_PRIVATE_PEM: &str = include_str!("../fixtures/realm_private.pem");
pub const OTHER_PRIVATE_PEM: &str = include_str!("../fixtures/other_private.pem");
pub const EC_PRIVATE_PEM: &str = include_str!("../fixtures/ec_private.pem");

/// Fixed clock for deterministic expiry checks.
pub const NOW: i64 = 1_750_000_000;

pub fn realm_key() -> EncodingKey {
    EncodingKey::from_rsa_pem(REALM_PRIVATE_PEM.as_bytes()).unwrap()
}

pub fn sign(claims: &Value) -> String {
    sign_with(Algorithm::RS256, &realm_key(), claims)
}

pub fn sign_with(alg: Algorithm, key: &EncodingKey, claims: &Value) -> String {
    let mut header = Header::new(alg);
    header.typ = Some("JWT".to_string());
    jsonwebtoken::encode(&header, claims, key).unwrap()
}

/// Keycloak-shaped access token payload for `a@b.com`.
pub fn claims_expiring_at(exp: i64) -> Value {
    json!({
        "exp": exp,
        "iat": exp - 300,
        "iss": "https://sso.example.com/realms/demo",
        "sub": "4f3c2a10-0000-4000-8000-000000000001",
        "typ": "Bearer",
        "email": "a@b.com",
        "preferred_username": "alice",
        "scope": "openid email profile",
        "resource_access": {
            "account": {"roles": ["manage-account", "view-profile"]}
        }
    })
}

pub fn valid_claims() -> Value {
    claims_expiring_at(NOW + 3600)
}

pub fn config() -> KeycloakConfig {
    KeycloakConfig {
        realm_public_key: Some(REALM_PUBLIC_PEM.to_string()),
        load_user_from_database: false,
        ..KeycloakConfig::default()
    }
}

pub fn alice() -> UserRecord {
    UserRecord {
        id: Uuid::parse_str("4f3c2a10-0000-4000-8000-000000000001").unwrap(),
        user_name: "alice".to_string(),
        email: Some("a@b.com".to_string()),
        image_url: None,
    }
}

/// In-memory user store that records every lookup.
#[derive(Default)]
pub struct StubUsers {
    pub users: Vec<UserRecord>,
    pub fail: bool,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl StubUsers {
    pub fn with(users: Vec<UserRecord>) -> Self {
        Self {
            users,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserProvider for StubUsers {
    async fn find_by_field(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<UserRecord>, UserStoreError> {
        self.calls
            .lock()
            .unwrap()
            .push((field.to_string(), value.to_string()));

        if self.fail {
            return Err(UserStoreError::Backend("connection refused".into()));
        }

        Ok(self
            .users
            .iter()
            .find(|u| field == "email" && u.email.as_deref() == Some(value))
            .cloned())
    }
}
