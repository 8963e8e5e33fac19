//! Local user lookup used after a token has been verified.
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// A local user linked to a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub user_name: String,
    pub email: Option<String>,
    pub image_url: Option<String>,
}

/// User-store errors, kept apart from `AuthError` so the store can be swapped.
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("invalid user field: {0}")]
    InvalidField(String),
    #[error("user store backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Finds a local user whose `field` equals `value`.
///
/// Implementations own their retry/timeout policy; the verifier calls this once
/// per verification and surfaces any error as-is.
#[async_trait]
pub trait UserProvider: Send + Sync {
    async fn find_by_field(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<UserRecord>, UserStoreError>;
}
