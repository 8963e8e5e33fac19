use std::{collections::HashSet, fmt, sync::Arc};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};

use crate::config::{ConfigError, KeycloakConfig};

use super::claims::Claims;
use super::key;
use super::principal::{Principal, VerifiedToken};
use super::user_provider::{UserProvider, UserStoreError};

/// Keycloak signs with the realm RSA key. Only RSA algorithms are accepted so a
/// token cannot pick a different family (e.g. HS256 keyed with the public key).
const RSA_ALGORITHMS: [Algorithm; 6] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// Why a bearer token was rejected. Every variant is terminal for the attempt.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("malformed bearer token")]
    MalformedToken,
    #[error("no realm public key configured")]
    MissingVerificationKey,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    TokenExpired,
    #[error("token is not authorized for any allowed resource")]
    ResourceNotAuthorized,
    #[error("missing principal attribute '{0}'")]
    MissingPrincipalAttribute(String),
    #[error("user not found")]
    UserNotFound,
    #[error("user lookup failed")]
    UserLookupFailed(#[source] UserStoreError),
}

impl AuthError {
    /// Stable machine-readable code (used in logs and error bodies).
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::MissingVerificationKey => "MISSING_VERIFICATION_KEY",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::ResourceNotAuthorized => "RESOURCE_NOT_AUTHORIZED",
            Self::MissingPrincipalAttribute(_) => "MISSING_PRINCIPAL_ATTRIBUTE",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::UserLookupFailed(_) => "USER_LOOKUP_FAILED",
        }
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::MalformedToken,
    }
}

/// Exactly three non-empty dot-separated segments.
fn is_well_formed(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    segments.len() == 3 && segments.iter().all(|s| !s.is_empty())
}

/// True when the JOSE header is a JSON object with a string `alg`, whatever its value.
fn declares_alg(token: &str) -> bool {
    token
        .split('.')
        .next()
        .and_then(|segment| URL_SAFE_NO_PAD.decode(segment).ok())
        .and_then(|bytes| serde_json::from_slice::<serde_json::Value>(&bytes).ok())
        .is_some_and(|header| header.get("alg").is_some_and(serde_json::Value::is_string))
}

/// Keycloak bearer-token verifier.
///
/// Holds only immutable state and is shared as `Arc<TokenVerifier>`. It never
/// logs; callers decide how failures are reported.
pub struct TokenVerifier {
    config: KeycloakConfig,
    decoding_key: Option<DecodingKey>,
    validation: Validation,
    // Present only when users are loaded from the database.
    user_provider: Option<Arc<dyn UserProvider>>,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("config", &self.config)
            .field("has_key", &self.decoding_key.is_some())
            .field("loads_users", &self.user_provider.is_some())
            .finish()
    }
}

impl TokenVerifier {
    /// A missing key is accepted here (verification then fails closed); a key
    /// that is present but unparsable is a startup error.
    pub fn new(
        config: KeycloakConfig,
        user_provider: Option<Arc<dyn UserProvider>>,
    ) -> Result<Self, ConfigError> {
        let decoding_key = config
            .realm_public_key
            .as_deref()
            .map(key::decoding_key)
            .transpose()
            .map_err(|_| ConfigError::Invalid("KEYCLOAK_REALM_PUBLIC_KEY"))?;

        let user_provider = if config.load_user_from_database {
            Some(user_provider.ok_or(ConfigError::Missing("user provider"))?)
        } else {
            None
        };

        // Expiry is checked by hand (exp <= now is expired, missing exp too).
        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = RSA_ALGORITHMS.to_vec();
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Ok(Self {
            config,
            decoding_key,
            validation,
            user_provider,
        })
    }

    pub fn config(&self) -> &KeycloakConfig {
        &self.config
    }

    /// Verify signature, expiry and resources, then map the principal claim.
    /// Performs no I/O.
    pub fn decode(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        self.decode_at(token, chrono::Utc::now().timestamp())
    }

    /// `decode` against an explicit clock (epoch seconds).
    pub fn decode_at(&self, token: &str, now: i64) -> Result<VerifiedToken, AuthError> {
        // Fail closed before looking at the token at all.
        let key = self
            .decoding_key
            .as_ref()
            .ok_or(AuthError::MissingVerificationKey)?;

        if !is_well_formed(token) {
            return Err(AuthError::MalformedToken);
        }

        let header = jsonwebtoken::decode_header(token).map_err(|_| {
            // `alg: none` and other names jsonwebtoken does not know fail here.
            if declares_alg(token) {
                AuthError::InvalidSignature
            } else {
                AuthError::MalformedToken
            }
        })?;
        if !RSA_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::InvalidSignature);
        }

        let claims = jsonwebtoken::decode::<Claims>(token, key, &self.validation)
            .map_err(classify)?
            .claims;

        let leeway = i64::try_from(self.config.leeway_seconds).unwrap_or(i64::MAX);
        match claims.exp() {
            Some(exp) if exp.saturating_add(leeway) > now => {}
            _ => return Err(AuthError::TokenExpired),
        }

        if !self.config.ignore_resources_validation && !self.resources_allowed(&claims) {
            return Err(AuthError::ResourceNotAuthorized);
        }

        let attribute = &self.config.token_principal_attribute;
        let principal_id = claims
            .scalar(attribute)
            .ok_or_else(|| AuthError::MissingPrincipalAttribute(attribute.clone()))?;

        Ok(VerifiedToken {
            principal_id,
            claims,
        })
    }

    /// Full verification: `decode`, then the optional user lookup and claims
    /// attachment. At most one lookup call; lookup errors are not retried.
    pub async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let verified = self.decode(token)?;
        self.finish(verified).await
    }

    /// `verify` against an explicit clock (epoch seconds).
    pub async fn verify_at(&self, token: &str, now: i64) -> Result<Principal, AuthError> {
        let verified = self.decode_at(token, now)?;
        self.finish(verified).await
    }

    async fn finish(&self, verified: VerifiedToken) -> Result<Principal, AuthError> {
        let user = match &self.user_provider {
            Some(provider) => {
                let found = provider
                    .find_by_field(&self.config.user_provider_credential, &verified.principal_id)
                    .await
                    .map_err(AuthError::UserLookupFailed)?;
                Some(found.ok_or(AuthError::UserNotFound)?)
            }
            None => None,
        };

        Ok(Principal::from_verified(
            verified,
            user,
            self.config.append_decoded_token,
        ))
    }

    fn resources_allowed(&self, claims: &Claims) -> bool {
        claims
            .resource_names()
            .any(|name| self.config.allowed_resources.iter().any(|a| a == name))
    }
}
