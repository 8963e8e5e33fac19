/// Factory: build `TokenVerifier` from application `Config`.
use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::{ConfigError, KeycloakConfig};
use crate::repos::user_repo::PgUserProvider;
use crate::services::auth::{TokenVerifier, UserProvider};

pub fn build_token_verifier(
    config: &KeycloakConfig,
    db: Option<PgPool>,
) -> Result<Arc<TokenVerifier>, ConfigError> {
    let provider = db.map(|pool| Arc::new(PgUserProvider::new(pool)) as Arc<dyn UserProvider>);

    let verifier = TokenVerifier::new(config.clone(), provider).map_err(|e| {
        warn!(error = %e, "failed to build token verifier");
        e
    })?;

    if config.realm_public_key.is_none() {
        warn!("KEYCLOAK_REALM_PUBLIC_KEY is not set; every bearer token will be rejected");
    }
    info!(
        allowed_resources = ?config.allowed_resources,
        principal_attribute = %config.token_principal_attribute,
        load_user_from_database = config.load_user_from_database,
        "token verifier ready"
    );

    Ok(Arc::new(verifier))
}
