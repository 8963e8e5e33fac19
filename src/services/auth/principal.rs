//! Authenticated identity handed to the rest of the application.
use std::collections::BTreeMap;

use serde::Serialize;

use super::claims::Claims;
use super::user_provider::UserRecord;

/// Output of `TokenVerifier::decode`: the token passed signature, expiry and
/// resource checks and the principal claim was found.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    pub principal_id: String,
    pub claims: Claims,
}

/// Authenticated principal derived from a verified token.
///
/// - `claims` is only present when the decoded token is appended.
/// - `roles` and `scopes` are always filled so role checks work either way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<Claims>,
    pub roles: BTreeMap<String, Vec<String>>,
    pub scopes: Vec<String>,
}

impl Principal {
    pub fn from_verified(
        verified: VerifiedToken,
        user: Option<UserRecord>,
        append_claims: bool,
    ) -> Self {
        let VerifiedToken {
            principal_id,
            claims,
        } = verified;

        let roles = claims
            .resource_names()
            .map(|resource| (resource.to_string(), claims.resource_roles(resource)))
            .collect();
        let scopes = claims.scopes();

        Self {
            id: principal_id,
            user,
            claims: append_claims.then_some(claims),
            roles,
            scopes,
        }
    }

    /// Roles granted for one client (`resource_access.<resource>.roles`).
    pub fn roles(&self, resource: &str) -> &[String] {
        self.roles.get(resource).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_role(&self, resource: &str, role: &str) -> bool {
        self.roles(resource).iter().any(|r| r == role)
    }

    pub fn has_any_role(&self, resource: &str, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(resource, role))
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}
